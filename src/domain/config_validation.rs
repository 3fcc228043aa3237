//! Configuration validation.
//!
//! Reads every section a ranking run needs, rejects bad values and
//! returns the typed [`RunSettings`].

use crate::domain::error::RsRankError;
use crate::domain::indicator::IndicatorSettings;
use crate::domain::lagged::DEFAULT_LAG_DAYS;
use crate::domain::price_series::DataQuality;
use crate::domain::provider::default_start;
use crate::domain::rs_calculator::{
    DEFAULT_MARKET_EPSILON_PCT, MIN_COMMON_DATES, PeriodWeight, RsSettings,
};
use crate::domain::score_cache::DEFAULT_TTL_HOURS;
use crate::domain::universe::{UniverseError, parse_tickers};
use crate::domain::worker_pool::DEFAULT_CONCURRENCY;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_BENCHMARK: &str = "SPY";
pub const DEFAULT_CACHE_PATH: &str = "output/score_cache.json";
pub const DEFAULT_REPORT_PATH: &str = "output/rs_rankings.csv";
pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Sqlite,
    Postgres,
}

/// Where a ticker list comes from. Files are read by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerSource {
    List(Vec<String>),
    File(PathBuf),
    BuiltIn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub enabled: bool,
    pub path: PathBuf,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub source: DataSource,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quality: DataQuality,
    pub benchmark: String,
    pub rs: RsSettings,
    pub market_tickers: TickerSource,
    pub concurrency: usize,
    pub target_tickers: TickerSource,
    pub lag_days: usize,
    pub include_lagged: bool,
    pub indicators: IndicatorSettings,
    pub cache: CacheSettings,
    pub report_path: PathBuf,
    pub top_n: usize,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> RsRankError {
    RsRankError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_config(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<RunSettings, RsRankError> {
    let source = validate_source(config)?;
    let (start_date, end_date) = validate_dates(config, today)?;
    let rs = validate_rs(config)?;
    let quality = validate_quality(config, &rs)?;

    Ok(RunSettings {
        source,
        start_date,
        end_date,
        quality,
        benchmark: config
            .get_string_or("rs", "benchmark", DEFAULT_BENCHMARK)
            .to_uppercase(),
        rs,
        market_tickers: ticker_source(config, "market")?,
        concurrency: positive(config, "market", "concurrency", DEFAULT_CONCURRENCY as i64)?,
        target_tickers: ticker_source(config, "ranking")?,
        lag_days: positive(config, "ranking", "lag_days", DEFAULT_LAG_DAYS as i64)?,
        include_lagged: config.get_bool("ranking", "include_lagged", true),
        indicators: validate_indicators(config)?,
        cache: validate_cache(config)?,
        report_path: PathBuf::from(config.get_string_or("report", "output", DEFAULT_REPORT_PATH)),
        top_n: positive(config, "report", "top_n", DEFAULT_TOP_N as i64)?,
    })
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<usize, RsRankError> {
    let value = config.get_int(section, key, default);
    if value < 1 {
        return Err(invalid(section, key, format!("{key} must be at least 1")));
    }
    Ok(value as usize)
}

fn validate_source(config: &dyn ConfigPort) -> Result<DataSource, RsRankError> {
    let source = config.get_string_or("data", "source", "csv").to_lowercase();
    match source.as_str() {
        "csv" => {
            if config.get_string("data", "csv_dir").is_none() {
                return Err(RsRankError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                });
            }
            Ok(DataSource::Csv)
        }
        "sqlite" => Ok(DataSource::Sqlite),
        "postgres" => Ok(DataSource::Postgres),
        other => Err(invalid(
            "data",
            "source",
            format!("unknown data source '{other}', expected csv, sqlite or postgres"),
        )),
    }
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, RsRankError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("data", key, format!("invalid {key} format, expected YYYY-MM-DD"))),
    }
}

fn validate_dates(
    config: &dyn ConfigPort,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), RsRankError> {
    let end = parse_date(config, "end_date")?.unwrap_or(today);
    let start = parse_date(config, "start_date")?.unwrap_or_else(|| default_start(end));
    if start >= end {
        return Err(invalid("data", "start_date", "start_date must be before end_date"));
    }
    Ok((start, end))
}

fn validate_rs(config: &dyn ConfigPort) -> Result<RsSettings, RsRankError> {
    let defaults = RsSettings::default();
    let labels = ["3m", "6m", "9m", "12m"];
    let mut periods = Vec::with_capacity(labels.len());
    let mut seen = HashSet::new();

    for (label, default) in labels.iter().zip(&defaults.periods) {
        let period_key = format!("period_{label}");
        let weight_key = format!("weight_{label}");
        let days = config.get_int("rs", &period_key, default.days as i64);
        if days < 1 {
            return Err(invalid("rs", &period_key, "period must be at least 1 day"));
        }
        if !seen.insert(days) {
            return Err(invalid("rs", &period_key, format!("duplicate period of {days} days")));
        }
        let weight = config.get_double("rs", &weight_key, default.weight);
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid("rs", &weight_key, "weight must be non-negative"));
        }
        periods.push(PeriodWeight {
            days: days as usize,
            weight,
        });
    }

    if periods.iter().map(|p| p.weight).sum::<f64>() <= 0.0 {
        return Err(invalid("rs", "weight_3m", "weights must not all be zero"));
    }

    let market_epsilon_pct = config.get_double("rs", "market_epsilon_pct", DEFAULT_MARKET_EPSILON_PCT);
    if !market_epsilon_pct.is_finite() || market_epsilon_pct <= 0.0 {
        return Err(invalid("rs", "market_epsilon_pct", "market_epsilon_pct must be positive"));
    }

    Ok(RsSettings {
        periods,
        market_epsilon_pct,
        min_common_dates: positive(config, "rs", "min_common_dates", MIN_COMMON_DATES as i64)?,
    })
}

fn validate_quality(config: &dyn ConfigPort, rs: &RsSettings) -> Result<DataQuality, RsRankError> {
    let defaults = DataQuality::default();
    let min_data_points =
        positive(config, "data", "min_data_points", defaults.min_data_points as i64)?;
    if min_data_points < rs.longest_period() + 1 {
        return Err(invalid(
            "data",
            "min_data_points",
            format!(
                "min_data_points must cover the longest period plus one ({})",
                rs.longest_period() + 1
            ),
        ));
    }
    let max_missing_ratio = config.get_double("data", "max_missing_ratio", defaults.max_missing_ratio);
    if !(0.0..=1.0).contains(&max_missing_ratio) {
        return Err(invalid("data", "max_missing_ratio", "max_missing_ratio must be between 0 and 1"));
    }
    Ok(DataQuality {
        min_data_points,
        max_missing_ratio,
    })
}

fn ticker_source(config: &dyn ConfigPort, section: &str) -> Result<TickerSource, RsRankError> {
    if let Some(list) = config.get_string(section, "tickers").filter(|s| !s.trim().is_empty()) {
        let tickers = parse_tickers(&list).map_err(|e: UniverseError| invalid(section, "tickers", e.to_string()))?;
        return Ok(TickerSource::List(tickers));
    }
    if let Some(path) = config
        .get_string(section, "tickers_file")
        .filter(|s| !s.trim().is_empty())
    {
        return Ok(TickerSource::File(PathBuf::from(path.trim())));
    }
    Ok(TickerSource::BuiltIn)
}

fn validate_indicators(config: &dyn ConfigPort) -> Result<IndicatorSettings, RsRankError> {
    let d = IndicatorSettings::default();
    let sma_short = positive(config, "indicators", "sma_short", d.sma_short as i64)?;
    let sma_long = positive(config, "indicators", "sma_long", d.sma_long as i64)?;
    if sma_short >= sma_long {
        return Err(invalid("indicators", "sma_short", "sma_short must be shorter than sma_long"));
    }
    let trend_days = positive(config, "indicators", "trend_days", d.trend_days as i64)?;
    if trend_days < 2 {
        return Err(invalid("indicators", "trend_days", "trend_days must be at least 2"));
    }
    let trend_threshold_pct =
        config.get_double("indicators", "trend_threshold_pct", d.trend_threshold_pct);
    if !trend_threshold_pct.is_finite() || trend_threshold_pct < 0.0 {
        return Err(invalid("indicators", "trend_threshold_pct", "threshold must be non-negative"));
    }
    let leader_min_score = config.get_int("indicators", "leader_min_score", i64::from(d.leader_min_score));
    if !(1..=99).contains(&leader_min_score) {
        return Err(invalid("indicators", "leader_min_score", "leader_min_score must be between 1 and 99"));
    }

    Ok(IndicatorSettings {
        sma_short,
        sma_long,
        trend_days,
        trend_threshold_pct,
        volume_window: positive(config, "indicators", "volume_window", d.volume_window as i64)?,
        high_window: positive(config, "indicators", "high_window", d.high_window as i64)?,
        leader_min_score: leader_min_score as u8,
    })
}

fn validate_cache(config: &dyn ConfigPort) -> Result<CacheSettings, RsRankError> {
    let ttl_hours = config.get_int("cache", "ttl_hours", DEFAULT_TTL_HOURS);
    if ttl_hours <= 0 {
        return Err(invalid("cache", "ttl_hours", "ttl_hours must be positive"));
    }
    Ok(CacheSettings {
        enabled: config.get_bool("cache", "enabled", true),
        path: PathBuf::from(config.get_string_or("cache", "path", DEFAULT_CACHE_PATH)),
        ttl_hours,
    })
}
