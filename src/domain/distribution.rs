//! Market-wide distribution of weighted RS values.
//!
//! The builder fans one fetch-and-compute unit per ticker out to the worker
//! pool. Failed tickers are logged and left out; only a batch in which every
//! ticker failed is an error.

use crate::domain::error::RsRankError;
use crate::domain::price_series::PriceSeries;
use crate::domain::provider::SeriesProvider;
use crate::domain::rs_calculator::{RsSettings, calculate_rs_raw};
use crate::domain::score_cache::{ScoreCache, ScoreContext};
use crate::domain::universe::TickerSet;
use crate::domain::worker_pool::{BatchStats, WorkerPool};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Below this success ratio the batch is flagged as a data-quality problem.
pub const MIN_SUCCESS_RATIO: f64 = 0.5;

/// Ticker to weighted RS. Only the values matter for scoring; the keys let
/// target tickers reuse a value that is already known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketDistribution {
    scores: BTreeMap<String, f64>,
}

impl MarketDistribution {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.scores.get(ticker).copied()
    }

    pub fn values(&self) -> Vec<f64> {
        self.scores.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(t, v)| (t.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for MarketDistribution {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistributionOutcome {
    pub distribution: MarketDistribution,
    /// Zeroed when the distribution came from the cache.
    pub stats: BatchStats,
    pub from_cache: bool,
    /// Fewer than [`MIN_SUCCESS_RATIO`] of the universe could be scored.
    pub low_quality: bool,
}

pub struct DistributionBuilder<'a> {
    provider: &'a SeriesProvider<'a>,
    pool: &'a WorkerPool,
    settings: &'a RsSettings,
    cache: Option<&'a ScoreCache<'a>>,
}

impl<'a> DistributionBuilder<'a> {
    pub fn new(
        provider: &'a SeriesProvider<'a>,
        pool: &'a WorkerPool,
        settings: &'a RsSettings,
    ) -> Self {
        Self {
            provider,
            pool,
            settings,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a ScoreCache<'a>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Weighted RS of every computable ticker in `tickers` against `benchmark`.
    pub fn build(
        &self,
        tickers: &TickerSet,
        benchmark: &PriceSeries,
    ) -> Result<DistributionOutcome, RsRankError> {
        if tickers.is_empty() {
            return Err(RsRankError::DistributionExhausted { attempted: 0 });
        }

        let context = ScoreContext::new(
            benchmark.ticker(),
            self.provider.start(),
            self.provider.end(),
            self.settings,
        );
        if let Some(distribution) = self.cache.and_then(|c| c.load(tickers, &context)) {
            if !distribution.is_empty() {
                let ratio = distribution.len() as f64 / tickers.len() as f64;
                return Ok(DistributionOutcome {
                    distribution,
                    stats: BatchStats::default(),
                    from_cache: true,
                    low_quality: ratio < MIN_SUCCESS_RATIO,
                });
            }
        }

        tracing::info!(
            tickers = tickers.len(),
            workers = self.pool.width(),
            benchmark = benchmark.ticker(),
            "building market distribution"
        );

        let results = self.pool.run(tickers.to_vec(), |ticker| {
            let outcome = self
                .provider
                .fetch(&ticker)
                .and_then(|series| calculate_rs_raw(&series, benchmark, self.settings));
            (ticker, outcome.map(|raw| raw.weighted_rs))
        });

        let mut stats = BatchStats::default();
        let mut scores = BTreeMap::new();
        for (ticker, outcome) in results {
            match outcome {
                Ok(weighted_rs) => {
                    stats.record(true);
                    scores.insert(ticker, weighted_rs);
                }
                Err(e) => {
                    stats.record(false);
                    tracing::warn!(ticker = %ticker, error = %e, "excluded from market distribution");
                }
            }
        }

        if stats.succeeded == 0 {
            tracing::error!(attempted = stats.attempted, "no market ticker could be scored");
            return Err(RsRankError::DistributionExhausted {
                attempted: stats.attempted,
            });
        }
        let low_quality = stats.success_ratio() < MIN_SUCCESS_RATIO;
        if low_quality {
            tracing::warn!(
                succeeded = stats.succeeded,
                attempted = stats.attempted,
                "market distribution built from under half of the universe"
            );
        }
        tracing::info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            "market distribution ready"
        );

        let distribution = MarketDistribution { scores };
        if let Some(cache) = self.cache {
            if let Err(e) = cache.store(tickers, &context, &distribution) {
                tracing::warn!(error = %e, "failed to write score cache");
            }
        }

        Ok(DistributionOutcome {
            distribution,
            stats,
            from_cache: false,
            low_quality,
        })
    }
}
