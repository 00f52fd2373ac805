//! Plain-text and CSV report adapters.

use std::io::Write;

use crate::adapters::csv_adapter::write_trades_csv;
use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::ScoutError;
use crate::domain::metrics::Summary;
use crate::ports::report_port::ReportPort;

const NOT_AVAILABLE: &str = "n/a";

fn fmt_fixed(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn fmt_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// The one-line result summary printed after a backtest.
pub fn summary_line(summary: &Summary, config: &BacktestConfig) -> String {
    format!(
        "SL={:?}⋅ATR  TP={:?}⋅ATR  TrailSL={:?}⋅ATR → Trades: {}, Win-rate: {}, Avg PnL: {}, Max DD: {}",
        config.stop_mult,
        config.target_mult,
        config.trail_mult,
        summary.total_trades,
        fmt_pct(summary.win_rate),
        fmt_fixed(summary.avg_pnl),
        fmt_fixed(summary.max_drawdown),
    )
}

/// Summary line, optionally followed by a breakdown table.
pub struct ConsoleReport {
    pub detailed: bool,
}

impl ConsoleReport {
    fn write_details(summary: &Summary, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{:<18} {:>12}", "Total PnL", format!("{:.2}", summary.total_pnl))?;
        writeln!(out, "{:<18} {:>12}", "Won", summary.trades_won)?;
        writeln!(out, "{:<18} {:>12}", "Lost", summary.trades_lost)?;
        writeln!(out, "{:<18} {:>12}", "Largest win", fmt_fixed(summary.largest_win))?;
        writeln!(out, "{:<18} {:>12}", "Largest loss", fmt_fixed(summary.largest_loss))?;
        writeln!(out, "{:<18} {:>12}", "Stop exits", summary.stop_exits)?;
        writeln!(out, "{:<18} {:>12}", "Target exits", summary.target_exits)?;
        writeln!(out, "{:<18} {:>12}", "End-of-data exits", summary.end_of_data_exits)?;
        Ok(())
    }
}

impl ReportPort for ConsoleReport {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        out: &mut dyn Write,
    ) -> Result<(), ScoutError> {
        writeln!(out, "{}", summary_line(&result.summary, config))?;
        if self.detailed {
            Self::write_details(&result.summary, out)?;
        }
        Ok(())
    }
}

/// Writes the trade ledger as CSV.
pub struct TradesCsvReport;

impl ReportPort for TradesCsvReport {
    fn write(
        &self,
        result: &BacktestResult,
        _config: &BacktestConfig,
        out: &mut dyn Write,
    ) -> Result<(), ScoutError> {
        write_trades_csv(out, &result.trades)
    }
}
