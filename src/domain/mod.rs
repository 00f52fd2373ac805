//! Core domain types and logic.

pub mod ohlcv;
pub mod bar;
pub mod trade;
pub mod simulator;
pub mod indicator;
pub mod indicator_helpers;
pub mod signals;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
