//! Standard indicator set computed for every data file.

use crate::domain::indicator::{
    atr, calculate_atr, calculate_ema, calculate_rsi, calculate_sma, macd,
};
use crate::domain::ohlcv::OhlcvBar;

pub const RSI_PERIOD: usize = 14;

/// Per-bar indicator columns, aligned with the source bars.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    pub sma_9: Vec<Option<f64>>,
    pub sma_21: Vec<Option<f64>>,
    pub sma_50: Vec<Option<f64>>,
    pub ema_9: Vec<Option<f64>>,
    pub ema_21: Vec<Option<f64>>,
    pub ema_50: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub atr_14: Vec<Option<f64>>,
    pub macd_hist: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.atr_14.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atr_14.is_empty()
    }
}

/// SMA 9/21/50, EMA 9/21/50, RSI(14), ATR(14) and the MACD(12,26,9) histogram.
pub fn apply_indicators(bars: &[OhlcvBar]) -> IndicatorFrame {
    IndicatorFrame {
        sma_9: calculate_sma(bars, 9).simple_values(),
        sma_21: calculate_sma(bars, 21).simple_values(),
        sma_50: calculate_sma(bars, 50).simple_values(),
        ema_9: calculate_ema(bars, 9).simple_values(),
        ema_21: calculate_ema(bars, 21).simple_values(),
        ema_50: calculate_ema(bars, 50).simple_values(),
        rsi_14: calculate_rsi(bars, RSI_PERIOD).simple_values(),
        atr_14: calculate_atr(bars, atr::DEFAULT_PERIOD).simple_values(),
        macd_hist: macd::calculate_macd_default(bars).histogram_values(),
    }
}
