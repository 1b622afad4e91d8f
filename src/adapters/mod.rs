//! Concrete adapter implementations for ports.

pub mod csv_market_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod stderr_notify_adapter;
