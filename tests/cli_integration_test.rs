//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading, CLI overrides and validation
//! - `signals` and `fetch --from-dir` writing signal CSVs on disk
//! - `backtest` over a generated signal file, with a trades ledger
//! - Exit codes for each error category
//! - The full fetch → indicators → signals → backtest pipeline with MockDataPort

mod common;

use clap::Parser;
use common::*;
use scoutbt::adapters::csv_adapter;
use scoutbt::cli::{self, BacktestOverrides, Cli};
use scoutbt::domain::backtest::{run_backtest, BacktestConfig, PositionPolicy};
use scoutbt::domain::config_validation::validate_backtest_config;
use scoutbt::domain::error::ScoutError;
use scoutbt::domain::indicator_helpers::apply_indicators;
use scoutbt::domain::signals::{build_bar_sequence, generate_signals, SignalConfig};
use scoutbt::ports::data_port::DataPort;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

fn run_args(args: &[&str]) -> ExitCode {
    let mut argv = vec!["scoutbt"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap())
}

// ExitCode has no PartialEq; compare the debug form.
fn assert_exit(code: ExitCode, expected: u8) {
    assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::from(expected)));
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Writes a synthetic OHLCV file and its signal file into `dir`.
fn prepare_signal_file(dir: &Path, bars: usize) -> std::path::PathBuf {
    let input = dir.join("BTCUSDT_1h.csv");
    fs::write(&input, ohlcv_csv(&synthetic_market(bars, 4))).unwrap();
    let output = dir.join("signals.csv");
    assert_exit(
        run_args(&["signals", "--input", path_str(&input), "--output", path_str(&output)]),
        0,
    );
    output
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_without_path_is_empty() {
        let adapter = cli::load_config(None).unwrap();
        assert_eq!(cli::build_backtest_config(&adapter), BacktestConfig::default());
    }

    #[test]
    fn load_config_missing_file() {
        let err = cli::load_config(Some(Path::new("/nonexistent/scoutbt.ini"))).unwrap_err();
        assert!(matches!(err, ScoutError::ConfigParse { .. }));
    }

    #[test]
    fn file_values_then_overrides_then_validation() {
        let ini = write_temp(
            "[backtest]\nstop_mult = 2.0\ntarget_mult = 1.0\nparallel = true\n",
            ".ini",
        );
        let adapter = cli::load_config(Some(ini.path())).unwrap();
        let config = cli::build_backtest_config(&adapter);
        assert_eq!(config.stop_mult, 2.0);
        assert!(config.parallel);

        let overrides = BacktestOverrides {
            target_mult: Some(-1.0),
            single_position: true,
            ..BacktestOverrides::default()
        };
        let config = cli::apply_overrides(config, &overrides);
        assert_eq!(config.policy, PositionPolicy::SinglePosition);
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, ScoutError::ConfigInvalid { key, .. } if key == "target_mult"));
    }
}

mod signals_command {
    use super::*;

    #[test]
    fn writes_indicator_and_signal_columns() {
        let dir = TempDir::new().unwrap();
        let output = prepare_signal_file(dir.path(), 150);

        let text = fs::read_to_string(&output).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "open_time,open,high,low,close,volume,sma_9,sma_21,sma_50,ema_9,ema_21,ema_50,\
             rsi_14,atr_14,macd_hist,signal_ema,signal"
        );
        assert_eq!(text.lines().count(), 151);

        // Warm-up rows leave ATR empty.
        let first_row: Vec<&str> = text.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(first_row[13], "");
    }

    #[test]
    fn signals_match_library_pipeline() {
        let dir = TempDir::new().unwrap();
        let output = prepare_signal_file(dir.path(), 150);

        let ohlcv = synthetic_market(150, 4);
        let frame = apply_indicators(&ohlcv);
        let expected = generate_signals(&ohlcv, &frame, &SignalConfig::default());

        let bars = csv_adapter::read_bar_sequence(&output).unwrap();
        let written: Vec<_> = bars.iter().map(|b| b.signal).collect();
        assert_eq!(written, expected);
        assert_eq!(bars[20].volatility, frame.atr_14[20]);
    }

    #[test]
    fn default_output_next_to_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("ETHUSDT_4h.csv");
        fs::write(&input, ohlcv_csv(&synthetic_market(60, 5))).unwrap();

        assert_exit(run_args(&["signals", "--input", path_str(&input)]), 0);
        assert!(dir.path().join("ETHUSDT_4h_signals.csv").exists());
    }

    #[test]
    fn zero_window_in_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, ohlcv_csv(&synthetic_market(30, 5))).unwrap();
        let ini = write_temp("[signals]\natr_window = 0\n", ".ini");

        let code = run_args(&[
            "signals",
            "--input",
            path_str(&input),
            "--config",
            path_str(ini.path()),
        ]);
        assert_exit(code, 2);
    }

    #[test]
    fn malformed_input_is_data_format_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.csv");
        fs::write(
            &input,
            "open_time,open,high,low,close,volume\n2024-01-01,1,2,x,1.5,10\n",
        )
        .unwrap();

        assert_exit(run_args(&["signals", "--input", path_str(&input)]), 4);
    }
}

mod backtest_command {
    use super::*;

    #[test]
    fn backtest_writes_trades_ledger() {
        let dir = TempDir::new().unwrap();
        let signals = prepare_signal_file(dir.path(), 200);
        let trades_out = dir.path().join("trades.csv");

        let code = run_args(&[
            "backtest",
            "--data",
            path_str(&signals),
            "--trades-out",
            path_str(&trades_out),
            "--details",
        ]);
        assert_exit(code, 0);

        let bars = csv_adapter::read_bar_sequence(&signals).unwrap();
        let expected = run_backtest(&bars, &BacktestConfig::default()).unwrap();
        let ledger = fs::read_to_string(&trades_out).unwrap();
        assert_eq!(ledger.lines().count(), expected.trades.len() + 1);
        assert!(ledger.starts_with("direction,signal_index,entry_index"));
    }

    #[test]
    fn parallel_and_single_position_flags_succeed() {
        let dir = TempDir::new().unwrap();
        let signals = prepare_signal_file(dir.path(), 120);

        assert_exit(
            run_args(&["backtest", "--data", path_str(&signals), "--parallel"]),
            0,
        );
        assert_exit(
            run_args(&[
                "backtest",
                "--data",
                path_str(&signals),
                "--single-position",
                "--trail",
                "0",
            ]),
            0,
        );
    }

    #[test]
    fn missing_data_file_is_data_source_error() {
        assert_exit(
            run_args(&["backtest", "--data", "/nonexistent/signals.csv"]),
            3,
        );
    }

    #[test]
    fn invalid_multiplier_is_config_error() {
        let dir = TempDir::new().unwrap();
        let signals = prepare_signal_file(dir.path(), 60);
        assert_exit(
            run_args(&["backtest", "--data", path_str(&signals), "--sl", "0"]),
            2,
        );
    }

    #[test]
    fn single_bar_is_invalid_input() {
        let data = write_temp(
            "open_time,open,high,low,close,atr_14,signal\n2024-01-01,1,2,0.5,1.5,0.3,1\n",
            ".csv",
        );
        assert_exit(
            run_args(&["backtest", "--data", path_str(data.path())]),
            5,
        );
    }

    #[test]
    fn out_of_order_timestamps_are_invalid_input() {
        let data = write_temp(
            "open_time,open,high,low,close,atr_14,signal\n\
             2024-01-02,1,2,0.5,1.5,0.3,1\n\
             2024-01-01,1,2,0.5,1.5,0.3,0\n",
            ".csv",
        );
        assert_exit(
            run_args(&["backtest", "--data", path_str(data.path())]),
            5,
        );
    }
}

mod fetch_command {
    use super::*;

    #[test]
    fn fetch_from_directory_keeps_latest_candles() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BTCUSDT_1h.csv"),
            ohlcv_csv(&synthetic_market(150, 4)),
        )
        .unwrap();
        let output = dir.path().join("out.csv");

        let code = run_args(&[
            "fetch",
            "--symbol",
            "BTCUSDT",
            "--interval",
            "1h",
            "--limit",
            "100",
            "--from-dir",
            path_str(dir.path()),
            "--output",
            path_str(&output),
        ]);
        assert_exit(code, 0);

        let bars = csv_adapter::read_bar_sequence(&output).unwrap();
        assert_eq!(bars.len(), 100);
        assert_eq!(bars[0].timestamp, ts(50));
    }

    #[test]
    fn fetch_unknown_symbol_from_directory() {
        let dir = TempDir::new().unwrap();
        let code = run_args(&["fetch", "--symbol", "DOGEUSDT", "--from-dir", path_str(dir.path())]);
        assert_exit(code, 3);
    }
}

mod pipeline {
    use super::*;

    fn pipeline_bars(port: &dyn DataPort, symbol: &str) -> Result<Vec<scoutbt::domain::bar::Bar>, ScoutError> {
        let ohlcv = port.fetch_ohlcv(symbol, "1h", 500)?;
        let frame = apply_indicators(&ohlcv);
        let signals = generate_signals(&ohlcv, &frame, &SignalConfig::default());
        Ok(build_bar_sequence(&ohlcv, &frame, &signals))
    }

    #[test]
    fn mock_source_through_backtest() {
        let port = MockDataPort::new().with_bars("BTCUSDT", synthetic_market(300, 3));
        let bars = pipeline_bars(&port, "BTCUSDT").unwrap();
        assert_eq!(bars.len(), 300);

        let result = run_backtest(&bars, &BacktestConfig::default()).unwrap();
        let tradable = bars[..bars.len() - 1]
            .iter()
            .filter(|b| b.signal.direction().is_some())
            .count();
        assert_eq!(result.summary.total_trades, tradable);
        assert_eq!(result.trades.len(), tradable);

        let parallel = run_backtest(
            &bars,
            &BacktestConfig {
                parallel: true,
                ..BacktestConfig::default()
            },
        )
        .unwrap();
        assert_eq!(parallel.trades, result.trades);
    }

    #[test]
    fn limit_keeps_most_recent_bars() {
        let port = MockDataPort::new().with_bars("BTCUSDT", synthetic_market(50, 3));
        let bars = port.fetch_ohlcv("BTCUSDT", "1h", 20).unwrap();
        assert_eq!(bars.len(), 20);
        assert_eq!(bars[0].timestamp, ts(30));
    }

    #[test]
    fn source_errors_propagate() {
        let port = MockDataPort::new().with_error("BTCUSDT", "rate limited");
        let err = pipeline_bars(&port, "BTCUSDT").unwrap_err();
        assert!(matches!(err, ScoutError::DataSource { .. }));
        assert_exit(ExitCode::from(&err), 3);
    }

    #[test]
    fn empty_source_is_invalid_input() {
        let port = MockDataPort::new();
        let bars = pipeline_bars(&port, "BTCUSDT").unwrap();
        let err = run_backtest(&bars, &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, ScoutError::InvalidInput { .. }));
    }
}
