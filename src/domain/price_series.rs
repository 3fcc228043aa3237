//! Validated daily price series.
//!
//! A [`PriceSeries`] is what the ranking engine consumes: unique ascending
//! dates, one strictly positive analysis price per date (adjusted close when
//! the source supplies it for every bar, close otherwise) and the volume.

use crate::domain::error::RsRankError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Trading days in the longest return window.
pub const LOOKBACK_PERIOD: usize = 252;

/// Extra bars required on top of the lookback window.
pub const MIN_DATA_MARGIN: usize = 10;

/// Data-quality thresholds a source must meet before a ticker is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataQuality {
    pub min_data_points: usize,
    pub max_missing_ratio: f64,
}

impl Default for DataQuality {
    fn default() -> Self {
        Self {
            min_data_points: LOOKBACK_PERIOD + MIN_DATA_MARGIN,
            max_missing_ratio: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
    volumes: Vec<i64>,
}

impl PriceSeries {
    /// Build a series from parallel columns.
    ///
    /// Dates must be strictly ascending and every price finite and positive.
    /// No minimum length is enforced here; see [`PriceSeries::from_bars`].
    pub fn new(
        ticker: impl Into<String>,
        dates: Vec<NaiveDate>,
        prices: Vec<f64>,
        volumes: Vec<i64>,
    ) -> Result<Self, RsRankError> {
        let ticker = ticker.into();
        if dates.len() != prices.len() || dates.len() != volumes.len() {
            return Err(RsRankError::MalformedSeries {
                ticker,
                reason: format!(
                    "column lengths differ: {} dates, {} prices, {} volumes",
                    dates.len(),
                    prices.len(),
                    volumes.len()
                ),
            });
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(RsRankError::MalformedSeries {
                ticker,
                reason: format!("dates not strictly ascending at {}", w[1]),
            });
        }
        if let Some(i) = prices.iter().position(|p| !p.is_finite() || *p <= 0.0) {
            return Err(RsRankError::InvalidPrice {
                ticker,
                date: dates[i],
            });
        }
        Ok(Self {
            ticker,
            dates,
            prices,
            volumes,
        })
    }

    /// Apply the provider contract to raw bars: sort, drop duplicate dates
    /// (last one wins), require `min_data_points` bars and a missing-close
    /// ratio within `max_missing_ratio`, then forward- and back-fill gaps.
    pub fn from_bars(
        ticker: &str,
        mut bars: Vec<OhlcvBar>,
        quality: &DataQuality,
    ) -> Result<Self, RsRankError> {
        if bars.is_empty() {
            return Err(RsRankError::NoData {
                ticker: ticker.to_string(),
            });
        }

        bars.sort_by_key(|b| b.date);
        let mut unique: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => unique.push(bar),
            }
        }

        if unique.len() < quality.min_data_points {
            return Err(RsRankError::InsufficientData {
                ticker: ticker.to_string(),
                bars: unique.len(),
                minimum: quality.min_data_points,
            });
        }

        let missing = unique.iter().filter(|b| !b.has_close()).count();
        let ratio = missing as f64 / unique.len() as f64;
        if ratio > quality.max_missing_ratio {
            return Err(RsRankError::ExcessiveMissing {
                ticker: ticker.to_string(),
                ratio,
                threshold: quality.max_missing_ratio,
            });
        }

        let adjusted_complete = unique
            .iter()
            .all(|b| b.adj_close.is_some_and(f64::is_finite));
        let raw: Vec<Option<f64>> = if adjusted_complete {
            unique.iter().map(|b| b.adj_close).collect()
        } else {
            unique
                .iter()
                .map(|b| b.close.filter(|c| c.is_finite()))
                .collect()
        };

        let prices = fill_gaps(&raw).ok_or_else(|| RsRankError::NoData {
            ticker: ticker.to_string(),
        })?;
        let dates = unique.iter().map(|b| b.date).collect();
        let volumes = unique.iter().map(|b| b.volume).collect();

        Self::new(ticker, dates, prices, volumes)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn volumes(&self) -> &[i64] {
        &self.volumes
    }

    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// The series as it stood `count` observations ago.
    pub fn without_last(&self, count: usize) -> Option<PriceSeries> {
        if count >= self.len() {
            return None;
        }
        let keep = self.len() - count;
        Some(PriceSeries {
            ticker: self.ticker.clone(),
            dates: self.dates[..keep].to_vec(),
            prices: self.prices[..keep].to_vec(),
            volumes: self.volumes[..keep].to_vec(),
        })
    }
}

/// Forward-fill, then back-fill leading gaps. `None` when nothing is present.
fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = values.iter().flatten().next().copied()?;
    let mut last = first;
    Some(
        values
            .iter()
            .map(|v| {
                if let Some(v) = v {
                    last = *v;
                }
                last
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: Option<f64>) -> OhlcvBar {
        OhlcvBar {
            ticker: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close,
            adj_close: None,
            volume: 1000,
        }
    }

    fn loose() -> DataQuality {
        DataQuality {
            min_data_points: 3,
            max_missing_ratio: 0.5,
        }
    }

    #[test]
    fn default_quality_matches_lookback_margin() {
        let q = DataQuality::default();
        assert_eq!(q.min_data_points, 262);
        assert!((q.max_missing_ratio - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn from_bars_sorts_and_dedupes() {
        let bars = vec![
            bar(3, Some(12.0)),
            bar(1, Some(10.0)),
            bar(2, Some(11.0)),
            bar(2, Some(11.5)),
        ];
        let series = PriceSeries::from_bars("TEST", bars, &loose()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.prices(), &[10.0, 11.5, 12.0]);
    }

    #[test]
    fn from_bars_fills_forward_then_backward() {
        let bars = vec![
            bar(1, None),
            bar(2, Some(10.0)),
            bar(3, None),
            bar(4, Some(12.0)),
        ];
        let series = PriceSeries::from_bars("TEST", bars, &loose()).unwrap();
        assert_eq!(series.prices(), &[10.0, 10.0, 10.0, 12.0]);
    }

    #[test]
    fn from_bars_rejects_short_history() {
        let bars = vec![bar(1, Some(10.0)), bar(2, Some(10.0))];
        let err = PriceSeries::from_bars("TEST", bars, &loose()).unwrap_err();
        assert!(matches!(
            err,
            RsRankError::InsufficientData { bars: 2, minimum: 3, .. }
        ));
    }

    #[test]
    fn from_bars_rejects_excessive_missing() {
        let bars = vec![bar(1, None), bar(2, None), bar(3, Some(10.0))];
        let err = PriceSeries::from_bars("TEST", bars, &loose()).unwrap_err();
        assert!(matches!(err, RsRankError::ExcessiveMissing { .. }));
    }

    #[test]
    fn from_bars_rejects_empty() {
        let err = PriceSeries::from_bars("TEST", vec![], &loose()).unwrap_err();
        assert!(matches!(err, RsRankError::NoData { .. }));
    }

    #[test]
    fn from_bars_rejects_non_positive_price() {
        let bars = vec![bar(1, Some(10.0)), bar(2, Some(0.0)), bar(3, Some(10.0))];
        let err = PriceSeries::from_bars("TEST", bars, &loose()).unwrap_err();
        assert!(matches!(err, RsRankError::InvalidPrice { .. }));
    }

    #[test]
    fn from_bars_uses_adjusted_when_complete() {
        let mut bars = vec![bar(1, Some(10.0)), bar(2, Some(11.0)), bar(3, Some(12.0))];
        for b in &mut bars {
            b.adj_close = b.close.map(|c| c / 2.0);
        }
        let series = PriceSeries::from_bars("TEST", bars, &loose()).unwrap();
        assert_eq!(series.prices(), &[5.0, 5.5, 6.0]);
    }

    #[test]
    fn from_bars_ignores_partial_adjusted_column() {
        let mut bars = vec![bar(1, Some(10.0)), bar(2, Some(11.0)), bar(3, Some(12.0))];
        bars[0].adj_close = Some(1.0);
        let series = PriceSeries::from_bars("TEST", bars, &loose()).unwrap();
        assert_eq!(series.prices(), &[10.0, 11.0, 12.0]);
    }

    #[test]
    fn new_rejects_unsorted_dates() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let result = PriceSeries::new("TEST", vec![d1, d2], vec![1.0, 2.0], vec![0, 0]);
        assert!(matches!(result, Err(RsRankError::MalformedSeries { .. })));
    }

    #[test]
    fn without_last_drops_trailing_observations() {
        let bars: Vec<OhlcvBar> = (1..=6).map(|d| bar(d, Some(d as f64))).collect();
        let series = PriceSeries::from_bars("TEST", bars, &loose()).unwrap();
        let lagged = series.without_last(2).unwrap();
        assert_eq!(lagged.len(), 4);
        assert_eq!(lagged.last_price(), Some(4.0));
        assert_eq!(lagged.last_date(), NaiveDate::from_ymd_opt(2024, 1, 4));
        assert!(series.without_last(6).is_none());
    }
}
