//! Core domain types and logic.

pub mod config_validation;
pub mod distribution;
pub mod error;
pub mod indicator;
pub mod lagged;
pub mod ohlcv;
pub mod pipeline;
pub mod price_series;
pub mod provider;
pub mod ranker;
pub mod rs_calculator;
pub mod rs_line;
pub mod score_cache;
pub mod summary;
pub mod universe;
pub mod worker_pool;
