//! CSV file adapter: OHLCV input, signal files, and trade ledgers.
//!
//! Columns are located by header name, so extra columns (other indicators,
//! helper flags) are ignored.

use crate::domain::bar::{Bar, Signal};
use crate::domain::error::ScoutError;
use crate::domain::indicator_helpers::IndicatorFrame;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::trade::Trade;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const VOLATILITY_COLUMN: &str = "atr_14";

/// Reads `<SYMBOL>_<interval>.csv` files from a directory.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol.to_uppercase(), interval))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScoutError> {
        let path = self.csv_path(symbol, interval);
        let mut bars = read_ohlcv(&path)?;
        if bars.len() > limit {
            bars.drain(..bars.len() - limit);
        }
        Ok(bars)
    }
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
    volatility: Option<usize>,
    signal: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, ScoutError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| ScoutError::DataFormat {
                line: 1,
                reason: format!("missing {} column", name),
            })
        };

        let timestamp = find("open_time")
            .or_else(|| find("timestamp"))
            .ok_or_else(|| ScoutError::DataFormat {
                line: 1,
                reason: "missing open_time column".into(),
            })?;

        Ok(Columns {
            timestamp,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
            volatility: find(VOLATILITY_COLUMN),
            signal: find("signal"),
        })
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str, ScoutError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| ScoutError::DataFormat {
            line: line_of(record),
            reason: format!("missing {} value", name),
        })
}

fn parse_f64(record: &StringRecord, idx: usize, name: &str) -> Result<f64, ScoutError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| ScoutError::DataFormat {
            line: line_of(record),
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Empty and NaN fields are undefined.
fn parse_optional_f64(
    record: &StringRecord,
    idx: usize,
    name: &str,
) -> Result<Option<f64>, ScoutError> {
    let raw = field(record, idx, name)?;
    if raw.is_empty() {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|e| ScoutError::DataFormat {
        line: line_of(record),
        reason: format!("invalid {} value: {}", name, e),
    })?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

fn parse_signal(record: &StringRecord, idx: usize) -> Result<Signal, ScoutError> {
    let value = parse_optional_f64(record, idx, "signal")?.unwrap_or(0.0);
    if value.fract() == 0.0 {
        if let Some(signal) = Signal::from_i8(value as i8).filter(|_| value.abs() <= 1.0) {
            return Ok(signal);
        }
    }
    Err(ScoutError::DataFormat {
        line: line_of(record),
        reason: format!("signal must be -1, 0 or 1, got {}", value),
    })
}

/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`,
/// `YYYY-MM-DD`, or integer epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

fn parse_time(record: &StringRecord, idx: usize) -> Result<NaiveDateTime, ScoutError> {
    let raw = field(record, idx, "open_time")?;
    parse_timestamp(raw).ok_or_else(|| ScoutError::DataFormat {
        line: line_of(record),
        reason: format!("invalid timestamp: {}", raw),
    })
}

fn open_file(path: &Path) -> Result<File, ScoutError> {
    File::open(path).map_err(|e| ScoutError::DataSource {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn records<R: Read>(
    reader: R,
) -> Result<(Columns, csv::StringRecordsIntoIter<R>), ScoutError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(|e| ScoutError::DataFormat {
        line: 1,
        reason: format!("CSV header error: {}", e),
    })?;
    let columns = Columns::locate(headers)?;
    Ok((columns, rdr.into_records()))
}

fn csv_error(e: csv::Error) -> ScoutError {
    ScoutError::DataFormat {
        line: e.position().map(|p| p.line()).unwrap_or(0),
        reason: format!("CSV parse error: {}", e),
    }
}

pub fn read_ohlcv_from<R: Read>(reader: R) -> Result<Vec<OhlcvBar>, ScoutError> {
    let (columns, rows) = records(reader)?;
    let mut bars = Vec::new();

    for result in rows {
        let record = result.map_err(csv_error)?;
        bars.push(OhlcvBar {
            timestamp: parse_time(&record, columns.timestamp)?,
            open: parse_f64(&record, columns.open, "open")?,
            high: parse_f64(&record, columns.high, "high")?,
            low: parse_f64(&record, columns.low, "low")?,
            close: parse_f64(&record, columns.close, "close")?,
            volume: match columns.volume {
                Some(idx) => parse_optional_f64(&record, idx, "volume")?.unwrap_or(0.0),
                None => 0.0,
            },
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

pub fn read_ohlcv(path: &Path) -> Result<Vec<OhlcvBar>, ScoutError> {
    read_ohlcv_from(open_file(path)?)
}

/// Reads a signal file into simulator bars, in file order.
///
/// File order is kept so that out-of-order timestamps are reported by the
/// simulator's validation instead of being silently repaired.
pub fn read_bar_sequence_from<R: Read>(reader: R) -> Result<Vec<Bar>, ScoutError> {
    let (columns, rows) = records(reader)?;
    let mut bars = Vec::new();

    for result in rows {
        let record = result.map_err(csv_error)?;
        bars.push(Bar {
            timestamp: parse_time(&record, columns.timestamp)?,
            open: parse_f64(&record, columns.open, "open")?,
            high: parse_f64(&record, columns.high, "high")?,
            low: parse_f64(&record, columns.low, "low")?,
            close: parse_f64(&record, columns.close, "close")?,
            volatility: match columns.volatility {
                Some(idx) => parse_optional_f64(&record, idx, VOLATILITY_COLUMN)?,
                None => None,
            },
            signal: match columns.signal {
                Some(idx) => parse_signal(&record, idx)?,
                None => Signal::None,
            },
        });
    }

    Ok(bars)
}

pub fn read_bar_sequence(path: &Path) -> Result<Vec<Bar>, ScoutError> {
    read_bar_sequence_from(open_file(path)?)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_error(e: csv::Error) -> ScoutError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => ScoutError::Io(io),
        other => ScoutError::Io(std::io::Error::other(format!("{:?}", other))),
    }
}

pub const SIGNAL_HEADERS: [&str; 17] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "sma_9",
    "sma_21",
    "sma_50",
    "ema_9",
    "ema_21",
    "ema_50",
    "rsi_14",
    "atr_14",
    "macd_hist",
    "signal_ema",
    "signal",
];

/// Writes bars with their indicator columns, raw crossovers and filtered signals.
pub fn write_signal_csv<W: Write>(
    writer: W,
    bars: &[OhlcvBar],
    frame: &IndicatorFrame,
    crossovers: &[Signal],
    signals: &[Signal],
) -> Result<(), ScoutError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SIGNAL_HEADERS).map_err(write_error)?;

    let col = |column: &[Option<f64>], i: usize| fmt_opt(column.get(i).copied().flatten());

    for (i, bar) in bars.iter().enumerate() {
        wtr.write_record([
            bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            col(&frame.sma_9, i),
            col(&frame.sma_21, i),
            col(&frame.sma_50, i),
            col(&frame.ema_9, i),
            col(&frame.ema_21, i),
            col(&frame.ema_50, i),
            col(&frame.rsi_14, i),
            col(&frame.atr_14, i),
            col(&frame.macd_hist, i),
            crossovers.get(i).copied().unwrap_or_default().to_string(),
            signals.get(i).copied().unwrap_or_default().to_string(),
        ])
        .map_err(write_error)?;
    }

    wtr.flush()?;
    Ok(())
}

pub const TRADE_HEADERS: [&str; 14] = [
    "direction",
    "signal_index",
    "entry_index",
    "entry_time",
    "entry_price",
    "volatility",
    "fixed_stop",
    "take_profit",
    "final_stop",
    "exit_index",
    "exit_time",
    "exit_price",
    "exit_reason",
    "pnl",
];

pub fn write_trades_csv<W: Write>(writer: W, trades: &[Trade]) -> Result<(), ScoutError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TRADE_HEADERS).map_err(write_error)?;

    for t in trades {
        wtr.write_record([
            t.direction.to_string(),
            t.signal_index.to_string(),
            t.entry_index.to_string(),
            t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            t.entry_price.to_string(),
            t.volatility_at_entry.to_string(),
            t.fixed_stop.to_string(),
            t.take_profit.to_string(),
            t.final_stop.to_string(),
            t.exit_index.to_string(),
            t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            t.exit_price.to_string(),
            t.exit_reason.to_string(),
            t.pnl.to_string(),
        ])
        .map_err(write_error)?;
    }

    wtr.flush()?;
    Ok(())
}
