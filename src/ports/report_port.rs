//! Report generation port trait.

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::ScoutError;
use std::io::Write;

/// Port for emitting backtest results.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        out: &mut dyn Write,
    ) -> Result<(), ScoutError>;
}
