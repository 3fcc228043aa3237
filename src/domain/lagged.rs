//! Score a ticker as it stood a few trading days ago.
//!
//! Both the ticker's and the benchmark's series lose their last `lag_days`
//! observations; the resulting weighted RS is scored against the current
//! market distribution, which is not rebuilt.

use crate::domain::price_series::PriceSeries;
use crate::domain::ranker::ScoreScale;
use crate::domain::rs_calculator::{RsSettings, calculate_rs_raw};

pub const DEFAULT_LAG_DAYS: usize = 5;

pub struct LaggedRescorer<'a> {
    settings: &'a RsSettings,
    lag_days: usize,
}

impl<'a> LaggedRescorer<'a> {
    pub fn new(settings: &'a RsSettings, lag_days: usize) -> Self {
        Self { settings, lag_days }
    }

    pub fn lag_days(&self) -> usize {
        self.lag_days
    }

    /// `None` when the truncated series no longer carry enough aligned history.
    pub fn rescore(
        &self,
        series: &PriceSeries,
        benchmark: &PriceSeries,
        scale: &ScoreScale,
    ) -> Option<u8> {
        let stock = series.without_last(self.lag_days)?;
        let market = benchmark.without_last(self.lag_days)?;
        match calculate_rs_raw(&stock, &market, self.settings) {
            Ok(raw) => scale.score(raw.weighted_rs),
            Err(e) => {
                tracing::debug!(
                    ticker = series.ticker(),
                    lag_days = self.lag_days,
                    error = %e,
                    "lagged score undefined"
                );
                None
            }
        }
    }
}
