//! Ranking report output port.

use crate::domain::error::RsRankError;
use crate::domain::pipeline::RankingReport;

pub trait ReportPort {
    fn write(&self, report: &RankingReport, output_path: &str) -> Result<(), RsRankError>;
}
