//! Port traits the domain depends on.

pub mod cache_port;
pub mod config_port;
pub mod data_port;
pub mod report_port;
