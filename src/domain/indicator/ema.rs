//! Exponential Moving Average indicator.
//!
//! α = 2/(n+1), seeded with the first close: EMA[0] = C[0],
//! EMA[i] = C[i]*α + EMA[i-1]*(1-α). Every bar is valid.

use crate::domain::indicator::{simple_point, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(span),
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = bars
        .iter()
        .zip(ema_values(&closes, span))
        .map(|(bar, v)| simple_point(bar.timestamp, Some(v)))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}

/// Recursive EMA over raw values, seeded with the first value.
pub fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;

    for (i, &v) in values.iter().enumerate() {
        ema = if i == 0 { v } else { v * alpha + ema * (1.0 - alpha) };
        out.push(ema);
    }

    out
}
