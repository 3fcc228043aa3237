//! One ranking run: distribution, target scoring, ranking, indicators and
//! lagged scores.

use crate::domain::distribution::{DistributionBuilder, MarketDistribution};
use crate::domain::error::RsRankError;
use crate::domain::indicator::{self, IndicatorSettings, IndicatorSnapshot};
use crate::domain::lagged::LaggedRescorer;
use crate::domain::provider::SeriesProvider;
use crate::domain::ranker::{RankedEntry, ScoreScale, TargetScorer, rank};
use crate::domain::rs_calculator::RsSettings;
use crate::domain::rs_line::RsLine;
use crate::domain::score_cache::ScoreCache;
use crate::domain::universe::TickerSet;
use crate::domain::worker_pool::{BatchStats, WorkerPool};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct RankedRow {
    pub ticker: String,
    pub rs_raw: f64,
    pub rs_score: u8,
    pub rank: usize,
    pub rs_line: RsLine,
    pub indicators: IndicatorSnapshot,
    pub rs_score_1w_ago: Option<u8>,
}

impl RankedRow {
    /// Latest RS-Line value.
    pub fn rs_line_value(&self) -> Option<f64> {
        self.rs_line.latest().map(|p| p.value)
    }

    pub fn rs_score_change(&self) -> Option<i16> {
        self.rs_score_1w_ago
            .map(|ago| i16::from(self.rs_score) - i16::from(ago))
    }
}

#[derive(Debug, Clone)]
pub struct RankingReport {
    pub benchmark: String,
    /// Last benchmark date in the window.
    pub as_of: Option<NaiveDate>,
    pub rows: Vec<RankedRow>,
    pub distribution: MarketDistribution,
    pub distribution_from_cache: bool,
    /// Under half of the market universe could be scored.
    pub distribution_low_quality: bool,
    pub market_stats: BatchStats,
    pub target_stats: BatchStats,
}

pub struct RankingEngine<'a> {
    provider: &'a SeriesProvider<'a>,
    pool: &'a WorkerPool,
    rs: &'a RsSettings,
    indicators: &'a IndicatorSettings,
    cache: Option<&'a ScoreCache<'a>>,
    lag_days: Option<usize>,
}

impl<'a> RankingEngine<'a> {
    pub fn new(
        provider: &'a SeriesProvider<'a>,
        pool: &'a WorkerPool,
        rs: &'a RsSettings,
        indicators: &'a IndicatorSettings,
    ) -> Self {
        Self {
            provider,
            pool,
            rs,
            indicators,
            cache: None,
            lag_days: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a ScoreCache<'a>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Also score each ticker as of `lag_days` observations ago.
    pub fn with_lag(mut self, lag_days: usize) -> Self {
        self.lag_days = Some(lag_days);
        self
    }

    pub fn run(
        &self,
        benchmark: &str,
        market: &TickerSet,
        targets: &[String],
    ) -> Result<RankingReport, RsRankError> {
        let benchmark_series = self.provider.fetch(benchmark)?;
        tracing::info!(
            benchmark,
            bars = benchmark_series.len(),
            start = %self.provider.start(),
            end = %self.provider.end(),
            "benchmark loaded"
        );

        let mut builder = DistributionBuilder::new(self.provider, self.pool, self.rs);
        if let Some(cache) = self.cache {
            builder = builder.with_cache(cache);
        }
        let outcome = builder.build(market, &benchmark_series)?;
        let scale = ScoreScale::from_distribution(&outcome.distribution);

        let scorer = TargetScorer::new(self.provider, self.pool, self.rs);
        let (scored, target_stats) =
            scorer.score_targets(targets, &benchmark_series, &outcome.distribution)?;
        let ranked = rank(&scale, scored);

        let rescorer = self.lag_days.map(|lag| LaggedRescorer::new(self.rs, lag));
        let rows = ranked
            .into_iter()
            .map(|entry| {
                let lagged = rescorer
                    .as_ref()
                    .and_then(|r| r.rescore(&entry.series, &benchmark_series, &scale));
                self.finish_row(entry, lagged)
            })
            .collect::<Vec<_>>();

        let leaders = rows.iter().filter(|r| r.indicators.leader).count();
        tracing::info!(
            ranked = rows.len(),
            market = outcome.distribution.len(),
            leaders,
            "ranking complete"
        );

        Ok(RankingReport {
            benchmark: benchmark.to_string(),
            as_of: benchmark_series.last_date(),
            rows,
            distribution: outcome.distribution,
            distribution_from_cache: outcome.from_cache,
            distribution_low_quality: outcome.low_quality,
            market_stats: outcome.stats,
            target_stats,
        })
    }

    fn finish_row(&self, entry: RankedEntry, rs_score_1w_ago: Option<u8>) -> RankedRow {
        let indicators =
            indicator::compute(&entry.series, &entry.rs_line, entry.rs_score, self.indicators);
        RankedRow {
            ticker: entry.ticker,
            rs_raw: entry.rs_raw,
            rs_score: entry.rs_score,
            rank: entry.rank,
            rs_line: entry.rs_line,
            indicators,
            rs_score_1w_ago,
        }
    }
}
