#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use scoutbt::domain::bar::{Bar, Signal};
use scoutbt::domain::error::ScoutError;
pub use scoutbt::domain::ohlcv::OhlcvBar;
use scoutbt::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScoutError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ScoutError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(limit);
        Ok(bars.into_iter().skip(skip).collect())
    }
}

/// Hourly timestamps from 2024-01-01 00:00.
pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::hours(i as i64)
}

pub fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, vol: f64) -> Bar {
    Bar {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        volatility: Some(vol),
        signal: Signal::None,
    }
}

pub fn flat_bars(n: usize, price: f64, vol: f64) -> Vec<Bar> {
    (0..n).map(|i| bar(i, price, price, price, price, vol)).collect()
}

pub fn with_signal(mut bar: Bar, signal: Signal) -> Bar {
    bar.signal = signal;
    bar
}

pub fn make_ohlcv(closes: &[f64], volumes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            OhlcvBar {
                timestamp: ts(i),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: volumes.get(i).copied().unwrap_or(1000.0),
            }
        })
        .collect()
}

/// Zig-zag closes with a volume spike every `spike_every` bars.
pub fn synthetic_market(n: usize, spike_every: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + 8.0 * (i as f64 / 6.0).sin() + 0.05 * i as f64)
        .collect();
    let volumes: Vec<f64> = (0..n)
        .map(|i| if i % spike_every == 0 { 5000.0 } else { 1000.0 })
        .collect();
    make_ohlcv(&closes, &volumes)
}

pub fn ohlcv_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("open_time,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
