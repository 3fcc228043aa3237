#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
pub use rsrank::domain::ohlcv::OhlcvBar;
use rsrank::domain::config_validation::{RunSettings, validate_config};
use rsrank::adapters::file_config_adapter::FileConfigAdapter;
use rsrank::domain::error::RsRankError;
use rsrank::domain::score_cache::Clock;
use rsrank::ports::data_port::DataPort;
use std::collections::HashMap;

pub const WINDOW_START: &str = "2024-01-01";
pub const BAR_COUNT: usize = 300;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RsRankError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(RsRankError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, RsRankError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RsRankError> {
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn bars_from_prices(ticker: &str, prices: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(WINDOW_START, "%Y-%m-%d").unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            ticker: ticker.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close: Some(close),
            adj_close: None,
            volume: 1_000,
        })
        .collect()
}

/// Compounding daily growth from 100.
pub fn generate_bars(ticker: &str, daily_growth: f64) -> Vec<OhlcvBar> {
    let prices: Vec<f64> = (0..BAR_COUNT)
        .map(|i| 100.0 * (1.0 + daily_growth).powi(i as i32))
        .collect();
    bars_from_prices(ticker, &prices)
}

pub fn flat_bars(ticker: &str) -> Vec<OhlcvBar> {
    bars_from_prices(ticker, &vec![100.0; BAR_COUNT])
}

/// Ten market tickers, five falling and five rising symmetrically, so a
/// flat benchmark puts zero RS at the middle of the distribution.
pub fn symmetric_market() -> Vec<(String, f64)> {
    (1..=5)
        .flat_map(|i| {
            let g = i as f64 * 0.0005;
            [(format!("UP{i}"), g), (format!("DN{i}"), -g)]
        })
        .collect()
}

pub fn market_port() -> MockDataPort {
    symmetric_market()
        .into_iter()
        .fold(MockDataPort::new().with_bars("SPY", flat_bars("SPY")), |port, (t, g)| {
            port.with_bars(&t, generate_bars(&t, g))
        })
}

pub fn market_tickers() -> Vec<String> {
    symmetric_market().into_iter().map(|(t, _)| t).collect()
}

pub const TEST_INI: &str = r#"
[data]
source = csv
csv_dir = data
start_date = 2023-06-01
end_date = 2025-06-01

[rs]
benchmark = SPY

[ranking]
include_lagged = true
"#;

pub fn settings_from(ini: &str) -> RunSettings {
    let config = FileConfigAdapter::from_string(ini).unwrap();
    validate_config(&config, date(2025, 6, 1)).unwrap()
}
