//! Score cache stored as a single JSON document.
//!
//! Writes go to a sibling temp file that is then renamed over the target,
//! so a reader never sees a half-written snapshot.

use crate::domain::error::RsRankError;
use crate::domain::score_cache::CacheSnapshot;
use crate::ports::cache_port::CachePort;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct JsonCacheAdapter {
    path: PathBuf,
}

fn cache_err(path: &Path, e: impl std::fmt::Display) -> RsRankError {
    RsRankError::Cache {
        reason: format!("{}: {e}", path.display()),
    }
}

impl JsonCacheAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CachePort for JsonCacheAdapter {
    fn read(&self) -> Result<Option<CacheSnapshot>, RsRankError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(cache_err(&self.path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| cache_err(&self.path, e))
    }

    fn write(&self, snapshot: &CacheSnapshot) -> Result<(), RsRankError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| cache_err(parent, e))?;
        }
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| cache_err(&self.path, e))?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| cache_err(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| cache_err(&self.path, e))
    }

    fn clear(&self) -> Result<(), RsRankError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(cache_err(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::distribution::MarketDistribution;
    use crate::domain::rs_calculator::RsSettings;
    use crate::domain::score_cache::ScoreContext;
    use crate::domain::universe::TickerSet;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn snapshot() -> CacheSnapshot {
        CacheSnapshot {
            tickers: TickerSet::new(["AAPL", "MSFT", "NVDA"]),
            context: ScoreContext::new(
                "SPY",
                NaiveDate::from_ymd_opt(2024, 10, 15).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
                &RsSettings::default(),
            ),
            created_at: Utc.with_ymd_and_hms(2026, 10, 15, 21, 30, 0).unwrap(),
            scores: MarketDistribution::from_iter([
                ("AAPL".to_string(), 0.1 + 0.2),
                ("MSFT".to_string(), -17.123456789012345),
                ("NVDA".to_string(), 1e-300),
            ]),
        }
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonCacheAdapter::new(dir.path().join("cache.json"));
        assert!(adapter.read().unwrap().is_none());
    }

    #[test]
    fn round_trip_is_bit_identical() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonCacheAdapter::new(dir.path().join("nested/cache.json"));
        let original = snapshot();
        adapter.write(&original).unwrap();

        let loaded = adapter.read().unwrap().unwrap();
        assert_eq!(loaded.tickers, original.tickers);
        assert_eq!(loaded.created_at, original.created_at);
        assert_eq!(loaded.context, original.context);
        for (ticker, value) in original.scores.iter() {
            let back = loaded.scores.get(ticker).unwrap();
            assert_eq!(back.to_bits(), value.to_bits(), "{ticker}");
        }
        assert!(!adapter.temp_path().exists());
    }

    #[test]
    fn corrupt_file_is_cache_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();
        let adapter = JsonCacheAdapter::new(path);
        assert!(matches!(adapter.read(), Err(RsRankError::Cache { .. })));
    }

    #[test]
    fn clear_removes_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonCacheAdapter::new(dir.path().join("cache.json"));
        adapter.write(&snapshot()).unwrap();
        adapter.clear().unwrap();
        assert!(adapter.read().unwrap().is_none());
        adapter.clear().unwrap();
    }
}
