//! Concrete adapter implementations for ports.

#[cfg(feature = "binance")]
pub mod binance_adapter;
pub mod console_report;
pub mod csv_adapter;
pub mod file_config_adapter;
