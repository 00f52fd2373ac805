//! Average True Range: simple rolling mean of the true range.
//!
//! TR[0] = high - low (no previous close); afterwards the usual
//! max(high - low, |high - prev_close|, |low - prev_close|).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{rolling_mean, simple_point, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let tr_values: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            Some(if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            })
        })
        .collect();

    let values = bars
        .iter()
        .zip(rolling_mean(&tr_values, period))
        .map(|(bar, atr)| simple_point(bar.timestamp, atr))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
