//! Technical signals derived from a ranked ticker's prices and RS Line.
//!
//! Every value is optional: a series too short for an indicator's window
//! yields `None` (or `false` for the boolean flags) rather than an error.

pub mod leader;
pub mod rs_high;
pub mod sma;
pub mod trend;
pub mod volume;

use crate::domain::price_series::PriceSeries;
use crate::domain::rs_line::RsLine;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSettings {
    pub sma_short: usize,
    pub sma_long: usize,
    pub trend_days: usize,
    /// Slope, in percent of the window's first value per day, beyond which
    /// the trend counts as rising or falling.
    pub trend_threshold_pct: f64,
    pub volume_window: usize,
    pub high_window: usize,
    /// Leaders need a score strictly above this.
    pub leader_min_score: u8,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            sma_short: 50,
            sma_long: 200,
            trend_days: 20,
            trend_threshold_pct: 0.5,
            volume_window: 50,
            high_window: 252,
            leader_min_score: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendArrow {
    Rising,
    #[default]
    Flat,
    Falling,
}

impl TrendArrow {
    pub fn from_slope(slope_pct: f64, threshold: f64) -> Self {
        if slope_pct > threshold {
            TrendArrow::Rising
        } else if slope_pct < -threshold {
            TrendArrow::Falling
        } else {
            TrendArrow::Flat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendArrow::Rising => "rising",
            TrendArrow::Flat => "flat",
            TrendArrow::Falling => "falling",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TrendArrow::Rising => "↑",
            TrendArrow::Flat => "→",
            TrendArrow::Falling => "↓",
        }
    }
}

impl fmt::Display for TrendArrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorSnapshot {
    pub sma_distance_pct: Option<f64>,
    pub rs_trend_pct: Option<f64>,
    pub rs_trend: TrendArrow,
    pub volume_surge: Option<f64>,
    pub rs_line_52w_high: bool,
    pub leader: bool,
}

pub fn compute(
    series: &PriceSeries,
    rs_line: &RsLine,
    rs_score: u8,
    settings: &IndicatorSettings,
) -> IndicatorSnapshot {
    let trend = trend::rs_trend(rs_line, settings.trend_days, settings.trend_threshold_pct);
    IndicatorSnapshot {
        sma_distance_pct: sma::sma_distance_pct(series.prices(), settings.sma_short),
        rs_trend_pct: trend.slope_pct,
        rs_trend: trend.arrow,
        volume_surge: volume::volume_surge(series.volumes(), settings.volume_window),
        rs_line_52w_high: rs_high::is_rs_line_high(rs_line, settings.high_window),
        leader: leader::is_leader(series.prices(), rs_score, settings),
    }
}
