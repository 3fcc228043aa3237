//! CLI definition and dispatch.

use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_cache_adapter::JsonCacheAdapter;
use crate::domain::config_validation::{DataSource, RunSettings, TickerSource, validate_config};
use crate::domain::error::RsRankError;
use crate::domain::pipeline::{RankingEngine, RankingReport};
use crate::domain::provider::SeriesProvider;
use crate::domain::score_cache::{CacheMiss, Clock, ScoreCache, ScoreContext, SystemClock};
use crate::domain::summary::render_console;
use crate::domain::universe::{
    TickerSet, default_market_tickers, default_tickers, parse_ticker_file, parse_tickers,
};
use crate::domain::worker_pool::WorkerPool;
use crate::logging::init_logging;
use crate::ports::cache_port::CachePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "rsrank", about = "Relative strength ranking against a market benchmark")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank target tickers by relative strength
    Rank {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated target tickers, overriding [ranking]
        #[arg(long)]
        tickers: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Ignore and do not update the score cache
        #[arg(long)]
        no_cache: bool,
        /// Rows to show in the console report
        #[arg(long)]
        top: Option<usize>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show available data range per ticker
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Inspect or clear the score cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    Show {
        #[arg(short, long)]
        config: PathBuf,
    },
    Clear {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Per-invocation overrides for a ranking run.
#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    pub tickers: Option<String>,
    pub output: Option<PathBuf>,
    pub no_cache: bool,
    pub top: Option<usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Rank {
            config,
            tickers,
            output,
            no_cache,
            top,
        } => run_rank(
            &config,
            &RankOptions {
                tickers,
                output,
                no_cache,
                top,
            },
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
        Command::Cache { action } => match action {
            CacheAction::Show { config } => run_cache_show(&config),
            CacheAction::Clear { config } => run_cache_clear(&config),
        },
    }
}

fn fail(err: &RsRankError) -> ExitCode {
    tracing::error!(error = %err, "command failed");
    eprintln!("error: {err}");
    err.into()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Load the INI file, start logging from its `[logging]` section and
/// validate everything else.
pub fn load_settings(path: &Path) -> Result<(FileConfigAdapter, RunSettings), ExitCode> {
    let config = FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    init_logging(
        &config.get_string_or("logging", "level", "info"),
        &config.get_string_or("logging", "format", "pretty"),
    );
    let settings = validate_config(&config, today()).map_err(|e| fail(&e))?;
    Ok((config, settings))
}

pub fn resolve_tickers(
    source: &TickerSource,
    builtin: fn() -> Vec<String>,
    section: &str,
) -> Result<Vec<String>, RsRankError> {
    match source {
        TickerSource::List(list) => Ok(list.clone()),
        TickerSource::BuiltIn => Ok(builtin()),
        TickerSource::File(path) => {
            let content = fs::read_to_string(path).map_err(|e| RsRankError::ConfigInvalid {
                section: section.to_string(),
                key: "tickers_file".into(),
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
            parse_ticker_file(&content).map_err(|e| RsRankError::ConfigInvalid {
                section: section.to_string(),
                key: "tickers_file".into(),
                reason: format!("{}: {e}", path.display()),
            })
        }
    }
}

pub fn create_data_port(
    settings: &RunSettings,
    config: &dyn ConfigPort,
) -> Result<Box<dyn DataPort>, RsRankError> {
    match settings.source {
        DataSource::Csv => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| RsRankError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir.trim()))))
        }
        DataSource::Sqlite => sqlite_port(config),
        DataSource::Postgres => postgres_port(config),
    }
}

#[cfg(feature = "sqlite")]
fn sqlite_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, RsRankError> {
    let adapter = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_port(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, RsRankError> {
    Err(feature_missing("sqlite"))
}

#[cfg(feature = "postgres")]
fn postgres_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, RsRankError> {
    let adapter = crate::adapters::postgres_adapter::PostgresAdapter::from_config(config)?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "postgres"))]
fn postgres_port(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, RsRankError> {
    Err(feature_missing("postgres"))
}

#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
fn feature_missing(name: &str) -> RsRankError {
    RsRankError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: format!("{name} support was not compiled in (enable the '{name}' feature)"),
    }
}

/// Run the full ranking pipeline. The cache is used only when `cache_port`
/// is given.
pub fn execute_ranking(
    settings: &RunSettings,
    data_port: &dyn DataPort,
    cache_port: Option<&dyn CachePort>,
    clock: &dyn Clock,
    market: &[String],
    targets: &[String],
) -> Result<RankingReport, RsRankError> {
    let provider = SeriesProvider::new(
        data_port,
        settings.start_date,
        settings.end_date,
        settings.quality,
    );
    let pool = WorkerPool::new(settings.concurrency)?;
    let cache = cache_port
        .map(|port| ScoreCache::new(port, clock, Duration::hours(settings.cache.ttl_hours)));

    let mut engine = RankingEngine::new(&provider, &pool, &settings.rs, &settings.indicators);
    if let Some(cache) = cache.as_ref() {
        engine = engine.with_cache(cache);
    }
    if settings.include_lagged {
        engine = engine.with_lag(settings.lag_days);
    }

    engine.run(&settings.benchmark, &TickerSet::new(market), targets)
}

fn run_rank(config_path: &Path, options: &RankOptions) -> ExitCode {
    let (config, settings) = match load_settings(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let targets = match options.tickers.as_deref() {
        Some(list) => parse_tickers(list).map_err(|e| RsRankError::ConfigInvalid {
            section: "ranking".into(),
            key: "--tickers".into(),
            reason: e.to_string(),
        }),
        None => resolve_tickers(&settings.target_tickers, default_tickers, "ranking"),
    };
    let targets = match targets {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let market = match resolve_tickers(&settings.market_tickers, default_market_tickers, "market")
    {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    let data_port = match create_data_port(&settings, &config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let cache_adapter = JsonCacheAdapter::new(settings.cache.path.clone());
    let cache_port: Option<&dyn CachePort> = if settings.cache.enabled && !options.no_cache {
        Some(&cache_adapter)
    } else {
        None
    };

    eprintln!(
        "Ranking {} tickers against {} ({} market tickers)...",
        targets.len(),
        settings.benchmark,
        market.len()
    );
    let report = match execute_ranking(
        &settings,
        data_port.as_ref(),
        cache_port,
        &SystemClock,
        &market,
        &targets,
    ) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| settings.report_path.clone());
    if let Err(e) = CsvReportAdapter::new().write(&report, &output.to_string_lossy()) {
        return fail(&e);
    }

    print!("{}", render_console(&report, options.top.unwrap_or(settings.top_n)));
    eprintln!("Rankings written to {}", output.display());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let (_config, settings) = match load_settings(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let targets = match resolve_tickers(&settings.target_tickers, default_tickers, "ranking") {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let market = match resolve_tickers(&settings.market_tickers, default_market_tickers, "market")
    {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    eprintln!("  Data source:  {:?}", settings.source);
    eprintln!("  Window:       {} to {}", settings.start_date, settings.end_date);
    eprintln!("  Benchmark:    {}", settings.benchmark);
    let periods: Vec<String> = settings
        .rs
        .periods
        .iter()
        .map(|p| format!("{}d x {:.2}", p.days, p.weight))
        .collect();
    eprintln!("  Periods:      {}", periods.join(", "));
    eprintln!("  Targets:      {} tickers", targets.len());
    eprintln!(
        "  Market:       {} tickers, {} workers",
        market.len(),
        settings.concurrency
    );
    eprintln!(
        "  Cache:        {} ({}, ttl {}h)",
        if settings.cache.enabled { "on" } else { "off" },
        settings.cache.path.display(),
        settings.cache.ttl_hours
    );
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> ExitCode {
    let (config, settings) = match load_settings(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let data_port = match create_data_port(&settings, &config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let tickers = match ticker {
        Some(t) => vec![t.trim().to_uppercase()],
        None => match data_port.list_symbols() {
            Ok(s) => s,
            Err(e) => return fail(&e),
        },
    };
    if tickers.is_empty() {
        eprintln!("No symbols found");
        return ExitCode::SUCCESS;
    }

    for t in &tickers {
        match data_port.get_data_range(t) {
            Ok(Some((first, last, count))) => {
                println!("{t}: {count} bars, {first} to {last}");
            }
            Ok(None) => println!("{t}: no data"),
            Err(e) => return fail(&e),
        }
    }
    ExitCode::SUCCESS
}

fn run_cache_show(config_path: &Path) -> ExitCode {
    let (_config, settings) = match load_settings(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let adapter = JsonCacheAdapter::new(settings.cache.path.clone());

    let snapshot = match adapter.read() {
        Ok(Some(s)) => s,
        Ok(None) => {
            println!("No score cache at {}", adapter.path().display());
            return ExitCode::SUCCESS;
        }
        Err(e) => return fail(&e),
    };

    let market = resolve_tickers(&settings.market_tickers, default_market_tickers, "market")
        .map(TickerSet::new);
    let context = ScoreContext::new(
        settings.benchmark.as_str(),
        settings.start_date,
        settings.end_date,
        &settings.rs,
    );
    let clock = SystemClock;
    let ttl = Duration::hours(settings.cache.ttl_hours);
    let status = match market {
        Ok(set) => match ScoreCache::new(&adapter, &clock, ttl).lookup(&set, &context) {
            Ok(_) => "fresh".to_string(),
            Err(CacheMiss::Stale { .. }) => "stale".to_string(),
            Err(CacheMiss::TickerSetChanged) => "ticker set changed".to_string(),
            Err(CacheMiss::SettingsChanged) => "scoring settings changed".to_string(),
            Err(miss) => format!("{miss:?}"),
        },
        Err(e) => format!("unknown ({e})"),
    };

    let age = snapshot.age(clock.now());
    println!("Path:     {}", adapter.path().display());
    println!("Created:  {}", snapshot.created_at.to_rfc3339());
    println!("Age:      {}h {}m", age.num_hours(), age.num_minutes() % 60);
    println!(
        "Scored:   vs {} from {} to {}",
        snapshot.context.benchmark, snapshot.context.start_date, snapshot.context.end_date
    );
    println!("Tickers:  {}", snapshot.tickers.len());
    println!("Scores:   {}", snapshot.scores.len());
    println!("Status:   {status}");
    ExitCode::SUCCESS
}

fn run_cache_clear(config_path: &Path) -> ExitCode {
    let (_config, settings) = match load_settings(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let adapter = JsonCacheAdapter::new(settings.cache.path.clone());
    match adapter.clear() {
        Ok(()) => {
            eprintln!("Cleared score cache at {}", adapter.path().display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rank_command() {
        let cli = Cli::try_parse_from([
            "rsrank", "rank", "--config", "rs.ini", "--tickers", "AAPL,MSFT", "--no-cache",
            "--top", "5",
        ])
        .unwrap();
        match cli.command {
            Command::Rank {
                config,
                tickers,
                no_cache,
                top,
                output,
            } => {
                assert_eq!(config, PathBuf::from("rs.ini"));
                assert_eq!(tickers.as_deref(), Some("AAPL,MSFT"));
                assert!(no_cache);
                assert_eq!(top, Some(5));
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_cache_subcommands() {
        let cli = Cli::try_parse_from(["rsrank", "cache", "clear", "-c", "rs.ini"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cache {
                action: CacheAction::Clear { .. }
            }
        ));
    }

    #[test]
    fn rank_requires_config() {
        assert!(Cli::try_parse_from(["rsrank", "rank"]).is_err());
    }

    #[test]
    fn resolve_builtin_and_list() {
        let builtin = resolve_tickers(&TickerSource::BuiltIn, default_tickers, "ranking").unwrap();
        assert_eq!(builtin, default_tickers());
        let list = TickerSource::List(vec!["AAPL".into()]);
        assert_eq!(
            resolve_tickers(&list, default_tickers, "ranking").unwrap(),
            vec!["AAPL"]
        );
    }

    #[test]
    fn resolve_missing_file_is_config_error() {
        let source = TickerSource::File(PathBuf::from("/nonexistent/tickers.txt"));
        let err = resolve_tickers(&source, default_tickers, "market").unwrap_err();
        assert!(matches!(err, RsRankError::ConfigInvalid { section, .. } if section == "market"));
    }
}
