//! Raw OHLCV bar as delivered by a data source.

use chrono::NaiveDate;

/// A daily bar before validation. `close` and `adj_close` may be missing;
/// gaps are filled when the bars become a [`PriceSeries`].
///
/// [`PriceSeries`]: crate::domain::price_series::PriceSeries
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: i64,
}

impl OhlcvBar {
    /// A close that is absent or not a finite number counts as missing.
    pub fn has_close(&self) -> bool {
        self.close.is_some_and(f64::is_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            ticker: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: Some(105.0),
            adj_close: Some(104.5),
            volume: 50_000,
        }
    }

    #[test]
    fn nan_close_is_missing() {
        let mut bar = sample_bar();
        bar.close = Some(f64::NAN);
        assert!(!bar.has_close());
        bar.close = None;
        assert!(!bar.has_close());
    }
}
