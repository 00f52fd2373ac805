//! Trade simulation over a bar sequence.
//!
//! Every nonzero signal at bar `i < last` opens a trade at bar `i + 1`'s open,
//! which is then walked forward until its stop or target is crossed, or the
//! data runs out. Trades never influence each other unless
//! [`PositionPolicy::SinglePosition`] is selected.

use log::debug;
use rayon::prelude::*;

use super::backtest::{BacktestConfig, PositionPolicy};
use super::bar::{Bar, Direction};
use super::error::ScoutError;
use super::trade::{OpenTrade, Trade};

pub const MIN_BARS: usize = 2;

/// Structural preconditions checked before any trade is opened.
pub fn validate_bars(bars: &[Bar]) -> Result<(), ScoutError> {
    if bars.len() < MIN_BARS {
        return Err(ScoutError::invalid_input(format!(
            "need at least {} bars, got {}",
            MIN_BARS,
            bars.len()
        )));
    }

    for (i, bar) in bars.iter().enumerate() {
        if let Some(v) = bar.volatility {
            if v < 0.0 {
                return Err(ScoutError::invalid_input(format!(
                    "negative volatility {} at bar {}",
                    v, i
                )));
            }
        }
    }

    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(ScoutError::invalid_input(format!(
                "timestamps not strictly increasing at bar {} ({} after {})",
                i + 1,
                pair[1].timestamp,
                pair[0].timestamp
            )));
        }
    }

    Ok(())
}

/// Simulates one trade for a signal observed at `signal_index`.
///
/// Caller guarantees `signal_index + 1 < bars.len()`.
pub fn simulate_trade(
    bars: &[Bar],
    signal_index: usize,
    direction: Direction,
    config: &BacktestConfig,
) -> Trade {
    let entry_index = signal_index + 1;
    let last = bars.len() - 1;
    let mut open = OpenTrade::open(direction, signal_index, entry_index, &bars[entry_index], config);

    let exit = (entry_index..=last)
        .find_map(|j| open.on_bar(j, &bars[j]))
        .unwrap_or_else(|| OpenTrade::end_of_data(last, &bars[last]));

    let trade = open.close(exit);
    debug!(
        "{} trade: entry #{} @ {:.4}, exit #{} @ {:.4} ({}), pnl {:.4}",
        trade.direction,
        trade.entry_index,
        trade.entry_price,
        trade.exit_index,
        trade.exit_price,
        trade.exit_reason,
        trade.pnl
    );
    trade
}

fn entry_signals(bars: &[Bar]) -> impl Iterator<Item = (usize, Direction)> + '_ {
    // A signal on the final bar has no next bar to enter on.
    bars[..bars.len() - 1]
        .iter()
        .enumerate()
        .filter_map(|(i, bar)| bar.signal.direction().map(|d| (i, d)))
}

/// Runs the simulation sequentially, returning trades ordered by entry index.
pub fn simulate(bars: &[Bar], config: &BacktestConfig) -> Result<Vec<Trade>, ScoutError> {
    validate_bars(bars)?;

    let mut trades = Vec::new();
    match config.policy {
        PositionPolicy::Overlapping => {
            for (i, direction) in entry_signals(bars) {
                trades.push(simulate_trade(bars, i, direction, config));
            }
        }
        PositionPolicy::SinglePosition => {
            // A signal is taken only once the previous trade has exited,
            // i.e. on or after its exit bar.
            let mut flat_from = 0usize;
            for (i, direction) in entry_signals(bars) {
                if i < flat_from {
                    continue;
                }
                let trade = simulate_trade(bars, i, direction, config);
                flat_from = trade.exit_index;
                trades.push(trade);
            }
        }
    }

    Ok(trades)
}

/// Same result as [`simulate`], with one rayon task per signal bar.
///
/// The single-position policy depends on previous exits, so it always runs
/// sequentially.
pub fn simulate_parallel(
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<Vec<Trade>, ScoutError> {
    if config.policy == PositionPolicy::SinglePosition {
        return simulate(bars, config);
    }
    validate_bars(bars)?;

    let signals: Vec<(usize, Direction)> = entry_signals(bars).collect();
    // Indexed collect keeps the signal order, which is entry order.
    let trades = signals
        .par_iter()
        .map(|&(i, direction)| simulate_trade(bars, i, direction, config))
        .collect();

    Ok(trades)
}
