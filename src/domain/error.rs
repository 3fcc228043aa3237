//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for rsrank.
///
/// Per-ticker variants (`NoData` through `NoReturns`) exclude a single ticker
/// from a batch and are never fatal on their own. The `*Exhausted` variants
/// are raised when every unit of a batch failed.
#[derive(Debug, thiserror::Error)]
pub enum RsRankError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("too many missing closes for {ticker}: {ratio:.2} exceeds {threshold:.2}")]
    ExcessiveMissing {
        ticker: String,
        ratio: f64,
        threshold: f64,
    },

    #[error("malformed series for {ticker}: {reason}")]
    MalformedSeries { ticker: String, reason: String },

    #[error("non-positive price for {ticker} on {date}")]
    InvalidPrice { ticker: String, date: NaiveDate },

    #[error("{ticker} shares {common} dates with the benchmark, need {minimum}")]
    Alignment {
        ticker: String,
        common: usize,
        minimum: usize,
    },

    #[error("no period return could be computed for {ticker}")]
    NoReturns { ticker: String },

    #[error("cannot build market distribution: all {attempted} tickers failed")]
    DistributionExhausted { attempted: usize },

    #[error("cannot rank: all {attempted} target tickers failed")]
    RankingExhausted { attempted: usize },

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error("score cache error: {reason}")]
    Cache { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RsRankError {
    /// True for failures that only exclude one ticker from a batch.
    pub fn is_per_ticker(&self) -> bool {
        matches!(
            self,
            RsRankError::NoData { .. }
                | RsRankError::InsufficientData { .. }
                | RsRankError::ExcessiveMissing { .. }
                | RsRankError::MalformedSeries { .. }
                | RsRankError::InvalidPrice { .. }
                | RsRankError::Alignment { .. }
                | RsRankError::NoReturns { .. }
        )
    }
}

impl From<&RsRankError> for std::process::ExitCode {
    fn from(err: &RsRankError) -> Self {
        let code: u8 = match err {
            RsRankError::Io(_) => 1,
            RsRankError::ConfigParse { .. }
            | RsRankError::ConfigMissing { .. }
            | RsRankError::ConfigInvalid { .. } => 2,
            RsRankError::Database { .. } | RsRankError::DatabaseQuery { .. } => 3,
            RsRankError::NoData { .. }
            | RsRankError::InsufficientData { .. }
            | RsRankError::ExcessiveMissing { .. }
            | RsRankError::MalformedSeries { .. }
            | RsRankError::InvalidPrice { .. }
            | RsRankError::Alignment { .. }
            | RsRankError::NoReturns { .. } => 5,
            RsRankError::DistributionExhausted { .. } | RsRankError::RankingExhausted { .. } => 6,
            RsRankError::WorkerPool { .. }
            | RsRankError::Cache { .. }
            | RsRankError::Report { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
