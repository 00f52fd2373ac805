//! Backtest parameters and the simulate-then-aggregate pipeline.

use log::{info, warn};

use super::bar::Bar;
use super::error::ScoutError;
use super::metrics::Summary;
use super::simulator::{simulate, simulate_parallel};
use super::trade::Trade;

pub const DEFAULT_STOP_MULT: f64 = 1.5;
pub const DEFAULT_TARGET_MULT: f64 = 0.5;
pub const DEFAULT_TRAIL_MULT: f64 = 0.5;

/// How signals that arrive while a trade is open are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionPolicy {
    /// Every signal opens its own trade, regardless of open ones.
    #[default]
    Overlapping,
    /// Signals before the current trade's exit bar are skipped.
    SinglePosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Initial stop distance, in units of entry volatility.
    pub stop_mult: f64,
    /// Take-profit distance, in units of entry volatility.
    pub target_mult: f64,
    /// Trailing buffer behind the best price; 0 disables trailing.
    pub trail_mult: f64,
    pub policy: PositionPolicy,
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            stop_mult: DEFAULT_STOP_MULT,
            target_mult: DEFAULT_TARGET_MULT,
            trail_mult: DEFAULT_TRAIL_MULT,
            policy: PositionPolicy::Overlapping,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub summary: Summary,
}

pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> Result<BacktestResult, ScoutError> {
    info!(
        "Simulating {} bars (stop {}x, target {}x, trail {}x, {:?})",
        bars.len(),
        config.stop_mult,
        config.target_mult,
        config.trail_mult,
        config.policy
    );

    let trades = if config.parallel {
        simulate_parallel(bars, config)?
    } else {
        simulate(bars, config)?
    };

    let degenerate = trades.iter().filter(|t| t.is_degenerate()).count();
    if degenerate > 0 {
        warn!(
            "{} of {} trades have a zero-width stop/target band (zero or undefined volatility)",
            degenerate,
            trades.len()
        );
    }

    let summary = Summary::compute(&trades);
    Ok(BacktestResult { trades, summary })
}
