//! PostgreSQL data adapter over `public.daily_prices`.

use crate::domain::error::RsRankError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};
use std::sync::{Mutex, MutexGuard};

/// One client shared by all workers; queries are serialized on the mutex.
pub struct PostgresAdapter {
    client: Mutex<Client>,
}

fn query_err(e: postgres::Error) -> RsRankError {
    RsRankError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RsRankError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| RsRankError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let client =
            Client::connect(&connection_string, NoTls).map_err(|e| RsRankError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: Mutex::new(client),
        })
    }

    fn client(&self) -> Result<MutexGuard<'_, Client>, RsRankError> {
        self.client.lock().map_err(|_| RsRankError::Database {
            reason: "postgres client lock poisoned".into(),
        })
    }

    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, RsRankError> {
        self.client()?.query(sql, params).map_err(query_err)
    }
}

impl DataPort for PostgresAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RsRankError> {
        let rows = self.query(
            "SELECT date, \
                    open::double precision, high::double precision, \
                    low::double precision, close::double precision, \
                    adj_close::double precision, volume::bigint \
             FROM public.daily_prices \
             WHERE ticker = $1 AND date >= $2 AND date <= $3 \
             ORDER BY date ASC",
            &[&ticker, &start_date, &end_date],
        )?;

        let bars = rows
            .into_iter()
            .map(|row| OhlcvBar {
                ticker: ticker.to_string(),
                date: row.get(0),
                open: row.get::<_, Option<f64>>(1).unwrap_or(f64::NAN),
                high: row.get::<_, Option<f64>>(2).unwrap_or(f64::NAN),
                low: row.get::<_, Option<f64>>(3).unwrap_or(f64::NAN),
                close: row.get(4),
                adj_close: row.get(5),
                volume: row.get::<_, Option<i64>>(6).unwrap_or(0),
            })
            .collect();

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, RsRankError> {
        let rows = self.query(
            "SELECT DISTINCT ticker FROM public.daily_prices ORDER BY ticker",
            &[],
        )?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RsRankError> {
        let rows = self.query(
            "SELECT MIN(date), MAX(date), COUNT(*) FROM public.daily_prices WHERE ticker = $1",
            &[&ticker],
        )?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let min: Option<NaiveDate> = row.get(0);
        let max: Option<NaiveDate> = row.get(1);
        let count: i64 = row.get(2);

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_connection_string() {
        match PostgresAdapter::from_config(&EmptyConfig) {
            Err(RsRankError::ConfigMissing { section, key }) => {
                assert_eq!(section, "postgres");
                assert_eq!(key, "connection_string");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }
}
