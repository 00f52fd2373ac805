//! Performance summary over a list of completed trades.
//!
//! Statistics that have no meaning for an empty trade list are `None`.
//! Drawdown is measured on the cumulative P&L in trade order, which only
//! approximates calendar order when trades overlap.

use super::trade::{ExitReason, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_trades: usize,
    pub win_rate: Option<f64>,
    pub avg_pnl: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub total_pnl: f64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub largest_win: Option<f64>,
    pub largest_loss: Option<f64>,
    pub stop_exits: usize,
    pub target_exits: usize,
    pub end_of_data_exits: usize,
}

impl Summary {
    pub fn compute(trades: &[Trade]) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let mut summary = Self::from_pnls(&pnls);

        for trade in trades {
            match trade.exit_reason {
                ExitReason::StopLoss => summary.stop_exits += 1,
                ExitReason::TakeProfit => summary.target_exits += 1,
                ExitReason::EndOfData => summary.end_of_data_exits += 1,
            }
        }
        summary
    }

    /// Summary from bare P&L values in trade order; exit counts stay zero.
    pub fn from_pnls(pnls: &[f64]) -> Self {
        let total_trades = pnls.len();
        let total_pnl: f64 = pnls.iter().sum();

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut largest_win: Option<f64> = None;
        let mut largest_loss: Option<f64> = None;

        for &pnl in pnls {
            if pnl > 0.0 {
                trades_won += 1;
                largest_win = Some(largest_win.map_or(pnl, |w| w.max(pnl)));
            } else if pnl < 0.0 {
                trades_lost += 1;
                largest_loss = Some(largest_loss.map_or(pnl, |l| l.min(pnl)));
            }
        }

        let (win_rate, avg_pnl) = if total_trades > 0 {
            (
                Some(trades_won as f64 / total_trades as f64),
                Some(total_pnl / total_trades as f64),
            )
        } else {
            (None, None)
        };

        Summary {
            total_trades,
            win_rate,
            avg_pnl,
            max_drawdown: max_drawdown(pnls),
            total_pnl,
            trades_won,
            trades_lost,
            largest_win,
            largest_loss,
            stop_exits: 0,
            target_exits: 0,
            end_of_data_exits: 0,
        }
    }
}

/// Largest drop of the cumulative P&L below its running peak.
///
/// The running peak starts at the first cumulative value, not at zero.
pub fn max_drawdown(pnls: &[f64]) -> Option<f64> {
    let mut iter = pnls.iter();
    let first = *iter.next()?;

    let mut cum = first;
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &pnl in iter {
        cum += pnl;
        if cum > peak {
            peak = cum;
        }
        let dd = peak - cum;
        if dd > max_dd {
            max_dd = dd;
        }
    }

    Some(max_dd)
}
