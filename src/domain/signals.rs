//! Entry signal classification: strict EMA(9)/EMA(21) crossovers confirmed by
//! volume, volatility and MACD filters.

use crate::domain::bar::{Bar, Signal};
use crate::domain::indicator::rolling_mean;
use crate::domain::indicator_helpers::IndicatorFrame;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_VOL_WINDOW: usize = 20;
pub const DEFAULT_VOL_MULT: f64 = 1.2;
pub const DEFAULT_ATR_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub vol_window: usize,
    pub vol_mult: f64,
    pub atr_window: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            vol_window: DEFAULT_VOL_WINDOW,
            vol_mult: DEFAULT_VOL_MULT,
            atr_window: DEFAULT_ATR_WINDOW,
        }
    }
}

/// Raw crossover before any filter is applied.
pub fn ema_crossovers(frame: &IndicatorFrame) -> Vec<Signal> {
    let mut out = vec![Signal::None; frame.len()];

    for i in 1..frame.len() {
        let (Some(fast), Some(slow), Some(prev_fast), Some(prev_slow)) = (
            frame.ema_9[i],
            frame.ema_21[i],
            frame.ema_9[i - 1],
            frame.ema_21[i - 1],
        ) else {
            continue;
        };

        if fast > slow && prev_fast <= prev_slow {
            out[i] = Signal::Long;
        } else if fast < slow && prev_fast >= prev_slow {
            out[i] = Signal::Short;
        }
    }

    out
}

/// Filtered signal per bar.
///
/// Comparisons against undefined values are false, so bars inside any
/// filter's warm-up never signal.
pub fn generate_signals(
    bars: &[OhlcvBar],
    frame: &IndicatorFrame,
    config: &SignalConfig,
) -> Vec<Signal> {
    let volumes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volume)).collect();
    let vol_ma = rolling_mean(&volumes, config.vol_window);
    let atr_ma = rolling_mean(&frame.atr_14, config.atr_window);

    ema_crossovers(frame)
        .into_iter()
        .enumerate()
        .map(|(i, cross)| {
            if cross == Signal::None {
                return Signal::None;
            }
            let vol_ok = vol_ma[i].is_some_and(|ma| bars[i].volume > ma * config.vol_mult);
            let atr_ok = matches!((frame.atr_14[i], atr_ma[i]), (Some(atr), Some(ma)) if atr > ma);
            let macd_ok = frame.macd_hist[i].is_some_and(|h| match cross {
                Signal::Long => h > 0.0,
                Signal::Short => h < 0.0,
                Signal::None => false,
            });

            if vol_ok && atr_ok && macd_ok {
                cross
            } else {
                Signal::None
            }
        })
        .collect()
}

/// Joins bars, their ATR and their signals into the simulator's input.
pub fn build_bar_sequence(bars: &[OhlcvBar], frame: &IndicatorFrame, signals: &[Signal]) -> Vec<Bar> {
    bars.iter()
        .enumerate()
        .map(|(i, b)| Bar {
            timestamp: b.timestamp,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volatility: frame.atr_14.get(i).copied().flatten(),
            signal: signals.get(i).copied().unwrap_or_default(),
        })
        .collect()
}
