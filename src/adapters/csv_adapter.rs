//! CSV file data adapter. One `{TICKER}.csv` per symbol.
//!
//! Columns are located by header name (case-insensitive): `date`, `open`,
//! `high`, `low`, `close`, `volume` and optionally `adj_close` (or
//! `adj close`). An empty close cell is a missing close.

use crate::domain::error::RsRankError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &str) -> Result<Self, RsRankError> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_ascii_lowercase();
                names.iter().any(|n| h == *n)
            })
        };
        let required = |names: &[&str]| {
            find(names).ok_or_else(|| RsRankError::Database {
                reason: format!("{path}: missing {} column", names[0]),
            })
        };

        Ok(Self {
            date: required(&["date"])?,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close: required(&["close"])?,
            adj_close: find(&["adj_close", "adj close", "adjclose"]),
            volume: find(&["volume"]),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    fn read_all(&self, ticker: &str) -> Result<Vec<OhlcvBar>, RsRankError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RsRankError::NoData {
                ticker: ticker.to_string(),
            },
            _ => RsRankError::Database {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;
        let path_str = path.display().to_string();

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| RsRankError::Database {
                reason: format!("{path_str}: CSV header error: {e}"),
            })?
            .clone();
        let cols = Columns::from_headers(&headers, &path_str)?;

        let mut bars = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| RsRankError::Database {
                reason: format!("{path_str}: CSV parse error: {e}"),
            })?;
            let row = line + 2;

            let date_str = record.get(cols.date).unwrap_or("").trim();
            let date = parse_date(date_str).ok_or_else(|| RsRankError::Database {
                reason: format!("{path_str}:{row}: invalid date '{date_str}'"),
            })?;

            let cell = |idx: Option<usize>, name: &str| -> Result<Option<f64>, RsRankError> {
                let Some(raw) = idx.and_then(|i| record.get(i)).map(str::trim) else {
                    return Ok(None);
                };
                if raw.is_empty() {
                    return Ok(None);
                }
                raw.parse::<f64>().map(Some).map_err(|e| RsRankError::Database {
                    reason: format!("{path_str}:{row}: invalid {name} value '{raw}': {e}"),
                })
            };

            let close = cell(Some(cols.close), "close")?;
            let adj_close = cell(cols.adj_close, "adj_close")?;
            let volume = cell(cols.volume, "volume")?.unwrap_or(0.0);

            bars.push(OhlcvBar {
                ticker: ticker.to_string(),
                date,
                open: cell(cols.open, "open")?.unwrap_or(f64::NAN),
                high: cell(cols.high, "high")?.unwrap_or(f64::NAN),
                low: cell(cols.low, "low")?.unwrap_or(f64::NAN),
                close,
                adj_close,
                volume: volume as i64,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RsRankError> {
        let mut bars = self.read_all(ticker)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, RsRankError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RsRankError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RsRankError::Database {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            if let Some(ticker) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(ticker.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RsRankError> {
        let bars = match self.read_all(ticker) {
            Ok(bars) => bars,
            Err(RsRankError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "Date,Open,High,Low,Close,Adj Close,Volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,114.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,104.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,109.0,60000\n";
        fs::write(path.join("AAPL.csv"), csv_content).unwrap();

        let gappy = "date,volume,close\n\
            2024-01-15,100,10.0\n\
            2024-01-16,,\n\
            2024-01-17 00:00:00,300,12.0\n";
        fs::write(path.join("MSFT.csv"), gappy).unwrap();

        fs::write(path.join("EMPTY.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fetch_ohlcv_reads_by_header_and_sorts() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("AAPL", jan(1), jan(31)).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, jan(15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, Some(105.0));
        assert_eq!(bars[0].adj_close, Some(104.0));
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, jan(17));
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("AAPL", jan(16), jan(16)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, jan(16));
    }

    #[test]
    fn empty_close_is_missing() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("MSFT", jan(1), jan(31)).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].close, None);
        assert_eq!(bars[1].volume, 0);
        assert!(bars[0].adj_close.is_none());
        assert_eq!(bars[2].date, jan(17));
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_ohlcv("XYZ", jan(1), jan(31));
        assert!(matches!(result, Err(RsRankError::NoData { ticker }) if ticker == "XYZ"));
    }

    #[test]
    fn missing_close_column_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("BAD.csv"), "date,open\n2024-01-15,1.0\n").unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let result = adapter.fetch_ohlcv("BAD", jan(1), jan(31));
        assert!(matches!(result, Err(RsRankError::Database { .. })));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().unwrap();
        assert_eq!(symbols, vec!["AAPL", "EMPTY", "MSFT"]);
    }

    #[test]
    fn data_range_reports_bounds() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(
            adapter.get_data_range("AAPL").unwrap(),
            Some((jan(15), jan(17), 3))
        );
        assert_eq!(adapter.get_data_range("EMPTY").unwrap(), None);
        assert_eq!(adapter.get_data_range("XYZ").unwrap(), None);
    }
}
