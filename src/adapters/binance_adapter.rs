//! Binance spot klines over the public REST API.
//!
//! The adapter is a plain value built from configuration and passed to
//! whoever needs market data.

use std::time::Duration;

use chrono::DateTime;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::ScoutError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
/// Largest page the klines endpoint serves.
pub const MAX_LIMIT: usize = 1000;
const KLINE_FIELDS: usize = 6;

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

pub struct BinanceAdapter {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl BinanceAdapter {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ScoutError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScoutError::DataSource {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Reads `[binance] base_url` and `[binance] api_key`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScoutError> {
        let base_url = config
            .get_string("binance", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, config.get_string("binance", "api_key"))
    }

    fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url)
    }
}

impl DataPort for BinanceAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScoutError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(ScoutError::invalid_input(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, limit
            )));
        }

        info!("Fetching last {} candles for {} @ {}", limit, symbol, interval);
        let limit_param = limit.to_string();
        let mut request = self.client.get(self.klines_url()).query(&[
            ("symbol", symbol),
            ("interval", interval),
            ("limit", limit_param.as_str()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send().map_err(|e| ScoutError::DataSource {
            reason: format!("request failed: {}", e),
        })?;
        let status = response.status();
        let body = response.text().map_err(|e| ScoutError::DataSource {
            reason: format!("failed to read response: {}", e),
        })?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => format!("HTTP {}: {} (code {})", status, err.msg, err.code),
                Err(_) => format!("HTTP {}", status),
            };
            return Err(ScoutError::DataSource { reason });
        }

        let bars = parse_klines(&body)?;
        debug!("Received {} candles", bars.len());
        Ok(bars)
    }
}

fn kline_error(row: usize, reason: impl Into<String>) -> ScoutError {
    ScoutError::DataSource {
        reason: format!("kline {}: {}", row, reason.into()),
    }
}

/// Prices arrive as JSON strings, timestamps as integers.
fn number(value: &Value, row: usize, name: &str) -> Result<f64, ScoutError> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|e| kline_error(row, format!("invalid {}: {}", name, e))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| kline_error(row, format!("invalid {}", name))),
        _ => Err(kline_error(row, format!("unexpected {} type", name))),
    }
}

/// Parses a klines response body (array of arrays) into bars.
///
/// Only the first six fields are used: open time in epoch milliseconds,
/// then open, high, low, close and volume.
pub fn parse_klines(body: &str) -> Result<Vec<OhlcvBar>, ScoutError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body).map_err(|e| ScoutError::DataSource {
        reason: format!("unexpected klines response: {}", e),
    })?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() < KLINE_FIELDS {
                return Err(kline_error(
                    i,
                    format!("expected at least {} fields, got {}", KLINE_FIELDS, row.len()),
                ));
            }
            let open_time = row[0]
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .ok_or_else(|| kline_error(i, "invalid open time"))?;

            Ok(OhlcvBar {
                timestamp: open_time.naive_utc(),
                open: number(&row[1], i, "open")?,
                high: number(&row[2], i, "high")?,
                low: number(&row[3], i, "low")?,
                close: number(&row[4], i, "close")?,
                volume: number(&row[5], i, "volume")?,
            })
        })
        .collect()
}
