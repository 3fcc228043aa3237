//! Percentile scoring of target tickers against the market distribution.
//!
//! Percentile-of-score uses the "rank" definition: with `left` values
//! strictly below `x` and `right` values at or below it,
//!
//!   pct = (left + right + [right > left]) * 50 / n
//!
//! so ties land on the average of their rank positions. The score is the
//! floored percentile clamped to 1..=99.

use crate::domain::distribution::MarketDistribution;
use crate::domain::error::RsRankError;
use crate::domain::price_series::PriceSeries;
use crate::domain::provider::SeriesProvider;
use crate::domain::rs_calculator::{RsSettings, calculate_rs_line, calculate_rs_raw};
use crate::domain::rs_line::RsLine;
use crate::domain::worker_pool::{BatchStats, WorkerPool};
use std::cmp::Ordering;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 99;

/// Sorted, finite distribution values ready for repeated percentile lookups.
#[derive(Debug, Clone, Default)]
pub struct ScoreScale {
    sorted: Vec<f64>,
}

impl ScoreScale {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    pub fn from_distribution(distribution: &MarketDistribution) -> Self {
        Self::new(distribution.values())
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Percentile of `x` in `0.0..=100.0`; `None` for an empty scale or a
    /// non-finite `x`.
    pub fn percentile(&self, x: f64) -> Option<f64> {
        if self.sorted.is_empty() || !x.is_finite() {
            return None;
        }
        let left = self.sorted.partition_point(|v| *v < x);
        let right = self.sorted.partition_point(|v| *v <= x);
        let bump = usize::from(right > left);
        Some((left + right + bump) as f64 * 50.0 / self.sorted.len() as f64)
    }

    pub fn score(&self, x: f64) -> Option<u8> {
        self.percentile(x).map(score_from_percentile)
    }
}

/// Percentile-of-score over an unsorted slice.
pub fn percentile_of_score(values: &[f64], x: f64) -> Option<f64> {
    ScoreScale::new(values.iter().copied()).percentile(x)
}

/// Floor, then clamp to 1..=99.
pub fn score_from_percentile(percentile: f64) -> u8 {
    let floored = percentile.floor();
    if floored.is_nan() || floored < f64::from(MIN_SCORE) {
        return MIN_SCORE;
    }
    if floored > f64::from(MAX_SCORE) {
        return MAX_SCORE;
    }
    floored as u8
}

/// A target ticker with its weighted RS and the series it was computed from.
#[derive(Debug, Clone)]
pub struct TargetRs {
    pub ticker: String,
    pub rs_raw: f64,
    pub rs_line: RsLine,
    pub series: PriceSeries,
    /// The weighted RS came from the market distribution.
    pub reused: bool,
}

#[derive(Debug, Clone)]
pub struct RankedEntry {
    pub ticker: String,
    pub rs_raw: f64,
    pub rs_score: u8,
    /// 1-based; equal scores share the lowest rank of their group.
    pub rank: usize,
    pub rs_line: RsLine,
    pub series: PriceSeries,
}

/// Computes [`TargetRs`] for every target ticker on the worker pool.
pub struct TargetScorer<'a> {
    provider: &'a SeriesProvider<'a>,
    pool: &'a WorkerPool,
    settings: &'a RsSettings,
}

impl<'a> TargetScorer<'a> {
    pub fn new(
        provider: &'a SeriesProvider<'a>,
        pool: &'a WorkerPool,
        settings: &'a RsSettings,
    ) -> Self {
        Self {
            provider,
            pool,
            settings,
        }
    }

    fn compute(
        &self,
        ticker: &str,
        benchmark: &PriceSeries,
        distribution: &MarketDistribution,
    ) -> Result<TargetRs, RsRankError> {
        let series = self.provider.fetch(ticker)?;
        let target = match distribution.get(ticker) {
            Some(rs_raw) => TargetRs {
                ticker: ticker.to_string(),
                rs_raw,
                rs_line: calculate_rs_line(&series, benchmark, self.settings)?,
                series,
                reused: true,
            },
            None => {
                let raw = calculate_rs_raw(&series, benchmark, self.settings)?;
                TargetRs {
                    ticker: ticker.to_string(),
                    rs_raw: raw.weighted_rs,
                    rs_line: raw.rs_line,
                    series,
                    reused: false,
                }
            }
        };
        Ok(target)
    }

    /// Targets that could not be computed are dropped with a warning. Fails
    /// only when none succeed.
    pub fn score_targets(
        &self,
        tickers: &[String],
        benchmark: &PriceSeries,
        distribution: &MarketDistribution,
    ) -> Result<(Vec<TargetRs>, BatchStats), RsRankError> {
        let results = self.pool.run(tickers.to_vec(), |ticker| {
            let outcome = self.compute(&ticker, benchmark, distribution);
            (ticker, outcome)
        });

        let mut stats = BatchStats::default();
        let mut targets = Vec::with_capacity(results.len());
        for (ticker, outcome) in results {
            match outcome {
                Ok(target) => {
                    stats.record(true);
                    targets.push(target);
                }
                Err(e) => {
                    stats.record(false);
                    tracing::warn!(ticker = %ticker, error = %e, "target ticker dropped");
                }
            }
        }

        if targets.is_empty() {
            return Err(RsRankError::RankingExhausted {
                attempted: stats.attempted,
            });
        }
        let reused = targets.iter().filter(|t| t.reused).count();
        tracing::info!(
            scored = targets.len(),
            dropped = stats.failed,
            reused,
            "target tickers scored"
        );
        Ok((targets, stats))
    }
}

/// Score every target and sort by score descending. Ties on score are
/// broken by raw RS, then ticker.
pub fn rank(scale: &ScoreScale, targets: Vec<TargetRs>) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = targets
        .into_iter()
        .map(|t| RankedEntry {
            rs_score: scale.score(t.rs_raw).unwrap_or(MIN_SCORE),
            ticker: t.ticker,
            rs_raw: t.rs_raw,
            rank: 0,
            rs_line: t.rs_line,
            series: t.series,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.rs_score
            .cmp(&a.rs_score)
            .then_with(|| b.rs_raw.partial_cmp(&a.rs_raw).unwrap_or(Ordering::Equal))
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    let mut rank = 0;
    for i in 0..entries.len() {
        if i == 0 || entries[i].rs_score != entries[i - 1].rs_score {
            rank = i + 1;
        }
        entries[i].rank = rank;
    }
    entries
}
