//! Relative-strength calculation.
//!
//! Period return over N trading days:
//!   R(N) = (P[-1] / P[-(N+1)] - 1) * 100
//!
//! Per-period relative strength against the benchmark return M(N):
//!   |M| <  epsilon: R - M
//!   |M| >= epsilon: ((1 + R/100) / (1 + M/100) - 1) * 100
//!
//! Weighted RS = sum(rs_i * w_i) / sum(w_i) over the periods that have both
//! a stock and a benchmark return.

use crate::domain::error::RsRankError;
use crate::domain::price_series::{LOOKBACK_PERIOD, PriceSeries};
use crate::domain::rs_line::RsLine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Benchmark return magnitude (in percent) below which the additive form is used.
pub const DEFAULT_MARKET_EPSILON_PCT: f64 = 0.1;

/// Floor on the number of shared dates, whatever the period set.
pub const MIN_COMMON_DATES: usize = 10;

/// Period length in trading days mapped to its return, in percent.
pub type PeriodReturns = BTreeMap<usize, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodWeight {
    pub days: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsSettings {
    pub periods: Vec<PeriodWeight>,
    pub market_epsilon_pct: f64,
    pub min_common_dates: usize,
}

impl Default for RsSettings {
    /// 3/6/9/12 months weighted 40/25/20/15.
    fn default() -> Self {
        Self {
            periods: vec![
                PeriodWeight { days: 63, weight: 0.40 },
                PeriodWeight { days: 126, weight: 0.25 },
                PeriodWeight { days: 189, weight: 0.20 },
                PeriodWeight { days: LOOKBACK_PERIOD, weight: 0.15 },
            ],
            market_epsilon_pct: DEFAULT_MARKET_EPSILON_PCT,
            min_common_dates: MIN_COMMON_DATES,
        }
    }
}

impl RsSettings {
    pub fn longest_period(&self) -> usize {
        self.periods.iter().map(|p| p.days).max().unwrap_or(0)
    }

    /// Shared dates needed before an RS value is attempted.
    pub fn required_common_dates(&self) -> usize {
        (self.longest_period() + 1).max(self.min_common_dates)
    }

    pub fn total_weight(&self) -> f64 {
        self.periods.iter().map(|p| p.weight).sum()
    }
}

/// Weighted RS scalar together with the RS Line it was computed alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct RsRaw {
    pub weighted_rs: f64,
    pub rs_line: RsLine,
}

/// Stock and benchmark prices restricted to the dates both series share.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPrices {
    pub dates: Vec<NaiveDate>,
    pub stock: Vec<f64>,
    pub market: Vec<f64>,
}

impl AlignedPrices {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Percentage return over the last `period_days` observations.
///
/// `None` when the series is shorter than `period_days + 1`, an endpoint is
/// not finite, or the anchor price is not positive.
pub fn calculate_period_return(prices: &[f64], period_days: usize) -> Option<f64> {
    if prices.len() < period_days + 1 {
        return None;
    }
    let current = prices[prices.len() - 1];
    let anchor = prices[prices.len() - 1 - period_days];
    if !current.is_finite() || !anchor.is_finite() || anchor <= 0.0 {
        return None;
    }
    Some((current / anchor - 1.0) * 100.0)
}

/// Returns for every configured period that can be computed.
pub fn calculate_period_returns(prices: &[f64], settings: &RsSettings) -> PeriodReturns {
    settings
        .periods
        .iter()
        .filter_map(|p| calculate_period_return(prices, p.days).map(|r| (p.days, r)))
        .collect()
}

/// Relative strength of one period, in percent.
pub fn relative_strength(stock_return: f64, market_return: f64, epsilon_pct: f64) -> f64 {
    let market_growth = 1.0 + market_return / 100.0;
    if market_return.abs() < epsilon_pct || market_growth <= 0.0 {
        return stock_return - market_return;
    }
    let stock_growth = 1.0 + stock_return / 100.0;
    (stock_growth / market_growth - 1.0) * 100.0
}

/// Weighted combination of per-period relative strength.
///
/// Periods missing from either side drop out and the remaining weights are
/// renormalized. `None` when no period contributes.
pub fn calculate_weighted_rs(
    stock_returns: &PeriodReturns,
    market_returns: &PeriodReturns,
    settings: &RsSettings,
) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for period in &settings.periods {
        let (Some(stock), Some(market)) = (
            stock_returns.get(&period.days),
            market_returns.get(&period.days),
        ) else {
            continue;
        };
        weighted += relative_strength(*stock, *market, settings.market_epsilon_pct) * period.weight;
        total_weight += period.weight;
    }

    if total_weight <= 0.0 {
        return None;
    }
    Some(weighted / total_weight)
}

/// Inner join of two series on date.
pub fn align(stock: &PriceSeries, market: &PriceSeries) -> AlignedPrices {
    let (sd, sp) = (stock.dates(), stock.prices());
    let (md, mp) = (market.dates(), market.prices());
    let mut aligned = AlignedPrices::default();
    let (mut i, mut j) = (0, 0);

    while i < sd.len() && j < md.len() {
        match sd[i].cmp(&md[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                aligned.dates.push(sd[i]);
                aligned.stock.push(sp[i]);
                aligned.market.push(mp[j]);
                i += 1;
                j += 1;
            }
        }
    }
    aligned
}

fn aligned_checked(
    stock: &PriceSeries,
    market: &PriceSeries,
    settings: &RsSettings,
) -> Result<AlignedPrices, RsRankError> {
    let aligned = align(stock, market);
    let minimum = settings.required_common_dates();
    if aligned.len() < minimum {
        return Err(RsRankError::Alignment {
            ticker: stock.ticker().to_string(),
            common: aligned.len(),
            minimum,
        });
    }
    Ok(aligned)
}

fn line_from(aligned: &AlignedPrices, ticker: &str) -> Result<RsLine, RsRankError> {
    let rs_line = RsLine::from_aligned(&aligned.dates, &aligned.stock, &aligned.market);
    if rs_line.is_empty() {
        return Err(RsRankError::Alignment {
            ticker: ticker.to_string(),
            common: 0,
            minimum: 1,
        });
    }
    Ok(rs_line)
}

/// Weighted RS and RS Line of `stock` against `market`, computed on the
/// same date alignment. Either both succeed or the call fails.
pub fn calculate_rs_raw(
    stock: &PriceSeries,
    market: &PriceSeries,
    settings: &RsSettings,
) -> Result<RsRaw, RsRankError> {
    let aligned = aligned_checked(stock, market, settings)?;

    let stock_returns = calculate_period_returns(&aligned.stock, settings);
    let market_returns = calculate_period_returns(&aligned.market, settings);
    let weighted_rs = calculate_weighted_rs(&stock_returns, &market_returns, settings)
        .ok_or_else(|| RsRankError::NoReturns {
            ticker: stock.ticker().to_string(),
        })?;

    let rs_line = line_from(&aligned, stock.ticker())?;
    Ok(RsRaw {
        weighted_rs,
        rs_line,
    })
}

/// RS Line alone, under the same alignment rules as [`calculate_rs_raw`].
/// Used when the weighted RS is already known from the market distribution.
pub fn calculate_rs_line(
    stock: &PriceSeries,
    market: &PriceSeries,
    settings: &RsSettings,
) -> Result<RsLine, RsRankError> {
    let aligned = aligned_checked(stock, market, settings)?;
    line_from(&aligned, stock.ticker())
}
