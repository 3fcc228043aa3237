//! Tracing subscriber setup.
//!
//! Logs go to stderr so the console report on stdout stays clean.
//! `RUST_LOG`, when set, overrides the configured level.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Database client crates kept at `warn`.
pub const NOISY_MODULES: &[&str] = &["tokio_postgres", "postgres", "r2d2"];

fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let mut directives = String::from(level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// `format` is `json` for structured output, anything else is human-readable.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: &str, format: &str) {
    let subscriber = tracing_subscriber::registry().with(build_filter(level));

    if format.eq_ignore_ascii_case("json") {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true);
        let _ = subscriber.with(layer).try_init();
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        let _ = subscriber.with(layer).try_init();
    }

    tracing::debug!(level, format, "logging initialized");
}
