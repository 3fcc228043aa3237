//! Persisted market-distribution snapshot with TTL and ticker-set identity.
//!
//! A snapshot is reused only for the same ticker set scored under the same
//! [`ScoreContext`]: benchmark, date window and RS settings.

use crate::domain::distribution::MarketDistribution;
use crate::domain::error::RsRankError;
use crate::domain::rs_calculator::RsSettings;
use crate::domain::universe::TickerSet;
use crate::ports::cache_port::CachePort;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TTL_HOURS: i64 = 24;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything besides the ticker set that a weighted RS value depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreContext {
    pub benchmark: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rs: RsSettings,
}

impl ScoreContext {
    pub fn new(
        benchmark: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        rs: &RsSettings,
    ) -> Self {
        Self {
            benchmark: benchmark.into(),
            start_date,
            end_date,
            rs: rs.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub tickers: TickerSet,
    pub context: ScoreContext,
    pub created_at: DateTime<Utc>,
    pub scores: MarketDistribution,
}

impl CacheSnapshot {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}

/// Why a stored snapshot was not used.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheMiss {
    Empty,
    TickerSetChanged,
    SettingsChanged,
    Stale { age: Duration },
    FromFuture,
    Unreadable(String),
}

pub struct ScoreCache<'a> {
    port: &'a dyn CachePort,
    clock: &'a dyn Clock,
    ttl: Duration,
}

impl<'a> ScoreCache<'a> {
    pub fn new(port: &'a dyn CachePort, clock: &'a dyn Clock, ttl: Duration) -> Self {
        Self { port, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached distribution for exactly `tickers` under `context`, if
    /// younger than the TTL.
    pub fn lookup(
        &self,
        tickers: &TickerSet,
        context: &ScoreContext,
    ) -> Result<MarketDistribution, CacheMiss> {
        let snapshot = match self.port.read() {
            Ok(Some(s)) => s,
            Ok(None) => return Err(CacheMiss::Empty),
            Err(e) => return Err(CacheMiss::Unreadable(e.to_string())),
        };

        if &snapshot.tickers != tickers {
            return Err(CacheMiss::TickerSetChanged);
        }
        if &snapshot.context != context {
            return Err(CacheMiss::SettingsChanged);
        }
        let age = snapshot.age(self.clock.now());
        if age < Duration::zero() {
            return Err(CacheMiss::FromFuture);
        }
        if age >= self.ttl {
            return Err(CacheMiss::Stale { age });
        }
        Ok(snapshot.scores)
    }

    /// [`ScoreCache::lookup`] with the miss reason logged and discarded.
    pub fn load(&self, tickers: &TickerSet, context: &ScoreContext) -> Option<MarketDistribution> {
        match self.lookup(tickers, context) {
            Ok(scores) => {
                tracing::info!(tickers = tickers.len(), scores = scores.len(), "score cache hit");
                Some(scores)
            }
            Err(CacheMiss::Unreadable(reason)) => {
                tracing::warn!(%reason, "score cache unreadable, recomputing");
                None
            }
            Err(miss) => {
                tracing::info!(?miss, "score cache miss");
                None
            }
        }
    }

    pub fn store(
        &self,
        tickers: &TickerSet,
        context: &ScoreContext,
        scores: &MarketDistribution,
    ) -> Result<(), RsRankError> {
        let snapshot = CacheSnapshot {
            tickers: tickers.clone(),
            context: context.clone(),
            created_at: self.clock.now(),
            scores: scores.clone(),
        };
        self.port.write(&snapshot)?;
        tracing::debug!(scores = scores.len(), "score cache written");
        Ok(())
    }
}
