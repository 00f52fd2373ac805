//! Trade lifecycle: an open position evolving its stop, and the closed record.

use super::backtest::BacktestConfig;
use super::bar::{Bar, Direction};
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub reason: ExitReason,
}

/// A position between entry and exit.
///
/// Levels derived from volatility are frozen at entry; only the trailing
/// extreme and the stop it implies move, and the stop only ever tightens.
#[derive(Debug, Clone)]
pub struct OpenTrade {
    direction: Direction,
    signal_index: usize,
    entry_index: usize,
    entry_time: NaiveDateTime,
    entry_price: f64,
    volatility: f64,
    fixed_stop: f64,
    take_profit: f64,
    /// `None` when trailing is disabled (`trail_mult == 0`).
    trail_distance: Option<f64>,
    trailing_extreme: f64,
    current_stop: f64,
}

impl OpenTrade {
    /// Opens at the entry bar's open. Undefined volatility counts as zero.
    pub fn open(
        direction: Direction,
        signal_index: usize,
        entry_index: usize,
        entry_bar: &Bar,
        config: &BacktestConfig,
    ) -> Self {
        let sig = direction.sign();
        let entry_price = entry_bar.open;
        let volatility = entry_bar.volatility_or_zero();
        let fixed_stop = entry_price - sig * config.stop_mult * volatility;

        OpenTrade {
            direction,
            signal_index,
            entry_index,
            entry_time: entry_bar.timestamp,
            entry_price,
            volatility,
            fixed_stop,
            take_profit: entry_price + sig * config.target_mult * volatility,
            trail_distance: (config.trail_mult > 0.0).then(|| config.trail_mult * volatility),
            trailing_extreme: entry_price,
            current_stop: fixed_stop,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn fixed_stop(&self) -> f64 {
        self.fixed_stop
    }

    pub fn take_profit(&self) -> f64 {
        self.take_profit
    }

    pub fn trailing_extreme(&self) -> f64 {
        self.trailing_extreme
    }

    pub fn current_stop(&self) -> f64 {
        self.current_stop
    }

    /// Advances the trade through one bar.
    ///
    /// The stop is checked before the target: when a single bar touches
    /// both, the stop exit wins.
    pub fn on_bar(&mut self, index: usize, bar: &Bar) -> Option<Exit> {
        let (stop_hit, target_hit) = match self.direction {
            Direction::Long => {
                self.trailing_extreme = self.trailing_extreme.max(bar.high);
                if let Some(distance) = self.trail_distance {
                    self.current_stop = self.fixed_stop.max(self.trailing_extreme - distance);
                }
                (bar.low <= self.current_stop, bar.high >= self.take_profit)
            }
            Direction::Short => {
                self.trailing_extreme = self.trailing_extreme.min(bar.low);
                if let Some(distance) = self.trail_distance {
                    self.current_stop = self.fixed_stop.min(self.trailing_extreme + distance);
                }
                (bar.high >= self.current_stop, bar.low <= self.take_profit)
            }
        };

        if stop_hit {
            Some(Exit {
                index,
                timestamp: bar.timestamp,
                price: self.current_stop,
                reason: ExitReason::StopLoss,
            })
        } else if target_hit {
            Some(Exit {
                index,
                timestamp: bar.timestamp,
                price: self.take_profit,
                reason: ExitReason::TakeProfit,
            })
        } else {
            None
        }
    }

    /// Fallback exit at the close of the final bar.
    pub fn end_of_data(index: usize, bar: &Bar) -> Exit {
        Exit {
            index,
            timestamp: bar.timestamp,
            price: bar.close,
            reason: ExitReason::EndOfData,
        }
    }

    pub fn close(self, exit: Exit) -> Trade {
        Trade {
            direction: self.direction,
            signal_index: self.signal_index,
            entry_index: self.entry_index,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            volatility_at_entry: self.volatility,
            fixed_stop: self.fixed_stop,
            take_profit: self.take_profit,
            trailing_extreme: self.trailing_extreme,
            final_stop: self.current_stop,
            exit_index: exit.index,
            exit_time: exit.timestamp,
            exit_price: exit.price,
            exit_reason: exit.reason,
            pnl: (exit.price - self.entry_price) * self.direction.sign(),
        }
    }
}

/// A completed simulated trade.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub direction: Direction,
    pub signal_index: usize,
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub volatility_at_entry: f64,
    pub fixed_stop: f64,
    pub take_profit: f64,
    pub trailing_extreme: f64,
    /// Stop level in force on the exit bar.
    pub final_stop: f64,
    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub pnl: f64,
}

impl Trade {
    /// Zero-width stop/target band, from zero or undefined volatility.
    pub fn is_degenerate(&self) -> bool {
        self.fixed_stop == self.take_profit
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index + 1
    }
}
