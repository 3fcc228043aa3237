//! Ranked table written as CSV, one row per ticker in rank order.

use crate::domain::error::RsRankError;
use crate::domain::pipeline::{RankedRow, RankingReport};
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub const CSV_HEADER: [&str; 13] = [
    "ticker",
    "rs_raw",
    "rs_score",
    "rank",
    "rs_line",
    "sma50_distance_pct",
    "rs_trend_pct",
    "rs_trend",
    "volume_surge",
    "rs_line_52w_high",
    "leader",
    "rs_score_1w_ago",
    "rs_score_change",
];

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record(row: &RankedRow) -> [String; 13] {
    let ind = &row.indicators;
    [
        row.ticker.clone(),
        row.rs_raw.to_string(),
        row.rs_score.to_string(),
        row.rank.to_string(),
        opt(row.rs_line_value()),
        opt(ind.sma_distance_pct),
        opt(ind.rs_trend_pct),
        ind.rs_trend.to_string(),
        opt(ind.volume_surge),
        ind.rs_line_52w_high.to_string(),
        ind.leader.to_string(),
        opt(row.rs_score_1w_ago),
        opt(row.rs_score_change()),
    ]
}

fn report_err(e: impl std::fmt::Display) -> RsRankError {
    RsRankError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &RankingReport, output_path: &str) -> Result<(), RsRankError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(report_err)?;
        writer.write_record(CSV_HEADER).map_err(report_err)?;
        for row in &report.rows {
            writer.write_record(record(row)).map_err(report_err)?;
        }
        writer.flush()?;

        tracing::info!(path = output_path, rows = report.rows.len(), "ranking CSV written");
        Ok(())
    }
}
