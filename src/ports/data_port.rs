//! Price-history access port.

use crate::domain::error::RsRankError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of daily bars. Shared across worker threads during a batch.
pub trait DataPort: Send + Sync {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RsRankError>;

    fn list_symbols(&self) -> Result<Vec<String>, RsRankError>;

    /// First date, last date and bar count, or `None` if the ticker is unknown.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RsRankError>;
}
