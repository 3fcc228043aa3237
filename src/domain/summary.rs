//! Score statistics and the plain-text console report.

use crate::domain::pipeline::{RankedRow, RankingReport};
use std::fmt;

pub const BOTTOM_N: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub total: usize,
    pub min: u8,
    pub max: u8,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` with a single score.
    pub std_dev: Option<f64>,
    pub at_least_70: usize,
    pub at_least_80: usize,
    pub at_least_90: usize,
}

impl SummaryStats {
    pub fn from_scores(scores: &[u8]) -> Option<Self> {
        let min = *scores.iter().min()?;
        let max = *scores.iter().max()?;
        let n = scores.len();

        let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / n as f64;

        let mut sorted = scores.to_vec();
        sorted.sort_unstable();
        let median = if n % 2 == 1 {
            f64::from(sorted[n / 2])
        } else {
            (f64::from(sorted[n / 2 - 1]) + f64::from(sorted[n / 2])) / 2.0
        };

        let std_dev = (n > 1).then(|| {
            let ss: f64 = scores.iter().map(|s| (f64::from(*s) - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });

        let at_least = |t: u8| scores.iter().filter(|s| **s >= t).count();
        Some(Self {
            total: n,
            min,
            max,
            mean,
            median,
            std_dev,
            at_least_70: at_least(70),
            at_least_80: at_least(80),
            at_least_90: at_least(90),
        })
    }

    pub fn from_rows(rows: &[RankedRow]) -> Option<Self> {
        let scores: Vec<u8> = rows.iter().map(|r| r.rs_score).collect();
        Self::from_scores(&scores)
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn write_table(f: &mut fmt::Formatter<'_>, rows: &[RankedRow]) -> fmt::Result {
    writeln!(
        f,
        "{:<6} {:<8} {:>5} {:>10} {:>8} {:>5} {:>7} {:>6} {:>6}",
        "Rank", "Ticker", "Score", "RS Raw", "SMA50%", "Trend", "VolX", "1W", "Lead"
    )?;
    writeln!(f, "{}", "-".repeat(72))?;
    for row in rows {
        writeln!(
            f,
            "{:<6} {:<8} {:>5} {:>10.2} {:>8} {:>5} {:>7} {:>6} {:>6}",
            row.rank,
            row.ticker,
            row.rs_score,
            row.rs_raw,
            fmt_opt(row.indicators.sma_distance_pct, 1),
            row.indicators.rs_trend.symbol(),
            fmt_opt(row.indicators.volume_surge, 2),
            row.rs_score_change()
                .map(|c| format!("{c:+}"))
                .unwrap_or_else(|| "-".to_string()),
            if row.indicators.leader { "*" } else { "" },
        )?;
    }
    Ok(())
}

/// Plain-text view of a report: statistics, the top `top_n` rows and the
/// bottom rows.
pub struct ConsoleReport<'a> {
    pub report: &'a RankingReport,
    pub top_n: usize,
}

impl fmt::Display for ConsoleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let rule = "=".repeat(72);
        let as_of = report
            .as_of
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(f, "{rule}")?;
        writeln!(f, "RS ranking vs {} as of {as_of}", report.benchmark)?;
        writeln!(f, "{rule}")?;

        let Some(stats) = SummaryStats::from_rows(&report.rows) else {
            return writeln!(f, "no ranked tickers");
        };

        writeln!(
            f,
            "Tickers: {}  Market universe: {}{}",
            stats.total,
            report.distribution.len(),
            if report.distribution_from_cache { " (cached)" } else { "" }
        )?;
        if report.distribution_low_quality {
            writeln!(
                f,
                "warning: market distribution built from under half of the universe ({} of {})",
                report.market_stats.succeeded, report.market_stats.attempted
            )?;
        }
        writeln!(
            f,
            "Score range: {} - {}  Mean: {:.2}  Median: {:.2}  Std: {}",
            stats.min,
            stats.max,
            stats.mean,
            stats.median,
            fmt_opt(stats.std_dev, 2)
        )?;
        writeln!(
            f,
            ">=70: {}  >=80: {}  >=90: {}",
            stats.at_least_70, stats.at_least_80, stats.at_least_90
        )?;

        let top = self.top_n.min(report.rows.len());
        writeln!(f, "\nTop {top}")?;
        write_table(f, &report.rows[..top])?;

        let bottom = BOTTOM_N.min(report.rows.len());
        writeln!(f, "\nBottom {bottom}")?;
        write_table(f, &report.rows[report.rows.len() - bottom..])
    }
}

pub fn render_console(report: &RankingReport, top_n: usize) -> String {
    ConsoleReport { report, top_n }.to_string()
}
