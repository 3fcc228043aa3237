//! RS-Line trend: least-squares slope over the most recent window.
//!
//! slope = sum((x - x̄)(y - ȳ)) / sum((x - x̄)²) with x = 0..n-1,
//! then slope_pct = slope / y[0] * 100 so tickers at different RS levels
//! compare on the same scale.

use crate::domain::indicator::TrendArrow;
use crate::domain::rs_line::RsLine;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RsTrend {
    pub slope_pct: Option<f64>,
    pub arrow: TrendArrow,
}

/// Ordinary least-squares slope of `values` against their index.
pub fn regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    Some(num / den)
}

/// Undefined slope and a flat arrow when the line has fewer than `days` points.
pub fn rs_trend(rs_line: &RsLine, days: usize, threshold_pct: f64) -> RsTrend {
    if days < 2 || rs_line.len() < days {
        return RsTrend::default();
    }
    let window: Vec<f64> = rs_line.tail(days).iter().map(|p| p.value).collect();
    let Some(slope) = regression_slope(&window) else {
        return RsTrend::default();
    };

    let slope_pct = if window[0] != 0.0 {
        slope / window[0] * 100.0
    } else {
        0.0
    };
    RsTrend {
        slope_pct: Some(slope_pct),
        arrow: TrendArrow::from_slope(slope_pct, threshold_pct),
    }
}
