//! Price-series provider: a data port plus the data-quality contract.

use crate::domain::error::RsRankError;
use crate::domain::price_series::{DataQuality, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::{Months, NaiveDate};

/// Fetches bars for a fixed date window and validates them into a
/// [`PriceSeries`]. Safe to share between worker threads.
pub struct SeriesProvider<'a> {
    data_port: &'a dyn DataPort,
    start: NaiveDate,
    end: NaiveDate,
    quality: DataQuality,
}

impl<'a> SeriesProvider<'a> {
    pub fn new(
        data_port: &'a dyn DataPort,
        start: NaiveDate,
        end: NaiveDate,
        quality: DataQuality,
    ) -> Self {
        Self {
            data_port,
            start,
            end,
            quality,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn quality(&self) -> &DataQuality {
        &self.quality
    }

    pub fn fetch(&self, ticker: &str) -> Result<PriceSeries, RsRankError> {
        let bars = self.data_port.fetch_ohlcv(ticker, self.start, self.end)?;
        tracing::debug!(ticker, bars = bars.len(), "fetched bars");
        PriceSeries::from_bars(ticker, bars, &self.quality)
    }
}

/// Two calendar years ending at `end`, enough to cover 252 trading days
/// with the margin the quality check asks for.
pub fn default_start(end: NaiveDate) -> NaiveDate {
    end.checked_sub_months(Months::new(24)).unwrap_or(NaiveDate::MIN)
}
