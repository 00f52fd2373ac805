//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::console_report::{ConsoleReport, TradesCsvReport};
use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{
    self as backtest_engine, BacktestConfig, PositionPolicy, DEFAULT_STOP_MULT,
    DEFAULT_TARGET_MULT, DEFAULT_TRAIL_MULT,
};
use crate::domain::bar::Signal;
use crate::domain::config_validation::{validate_backtest_config, validate_signal_config};
use crate::domain::error::ScoutError;
use crate::domain::indicator_helpers::apply_indicators;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signals::{
    ema_crossovers, generate_signals, SignalConfig, DEFAULT_ATR_WINDOW, DEFAULT_VOL_MULT,
    DEFAULT_VOL_WINDOW,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "scoutbt",
    about = "ATR stop/target backtester with EMA crossover signal generation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate trades over a signal CSV and print the summary
    Backtest {
        /// CSV with open_time, open, high, low, close, atr_14 and signal columns
        #[arg(short, long)]
        data: PathBuf,
        /// Initial stop distance in ATR units
        #[arg(long)]
        sl: Option<f64>,
        /// Take-profit distance in ATR units
        #[arg(long)]
        tp: Option<f64>,
        /// Trailing stop buffer in ATR units (0 disables trailing)
        #[arg(long)]
        trail: Option<f64>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write every simulated trade to this CSV file
        #[arg(long)]
        trades_out: Option<PathBuf>,
        /// Skip signals while a trade is open
        #[arg(long)]
        single_position: bool,
        /// Simulate trades on the rayon thread pool
        #[arg(long)]
        parallel: bool,
        /// Print a breakdown after the summary line
        #[arg(long)]
        details: bool,
    },
    /// Compute indicators and signals for an OHLCV CSV
    Signals {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Download candles, compute indicators and signals
    Fetch {
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,
        #[arg(long, default_value = "1h")]
        interval: String,
        #[arg(long, default_value_t = 500)]
        limit: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Read <SYMBOL>_<interval>.csv from this directory instead of Binance
        #[arg(long)]
        from_dir: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct BacktestOverrides {
    pub stop_mult: Option<f64>,
    pub target_mult: Option<f64>,
    pub trail_mult: Option<f64>,
    pub single_position: bool,
    pub parallel: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            data,
            sl,
            tp,
            trail,
            config,
            trades_out,
            single_position,
            parallel,
            details,
        } => {
            let overrides = BacktestOverrides {
                stop_mult: sl,
                target_mult: tp,
                trail_mult: trail,
                single_position,
                parallel,
            };
            run_backtest(
                &data,
                config.as_deref(),
                &overrides,
                trades_out.as_deref(),
                details,
            )
        }
        Command::Signals {
            input,
            output,
            config,
        } => run_signals(&input, output.as_deref(), config.as_deref()),
        Command::Fetch {
            symbol,
            interval,
            limit,
            output,
            config,
            from_dir,
        } => run_fetch(
            &symbol,
            &interval,
            limit,
            output.as_deref(),
            config.as_deref(),
            from_dir,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads the INI file, or an empty configuration when none is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ScoutError> {
    match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> BacktestConfig {
    let single_position = config.get_bool("backtest", "single_position", false);
    BacktestConfig {
        stop_mult: config.get_double("backtest", "stop_mult", DEFAULT_STOP_MULT),
        target_mult: config.get_double("backtest", "target_mult", DEFAULT_TARGET_MULT),
        trail_mult: config.get_double("backtest", "trail_mult", DEFAULT_TRAIL_MULT),
        policy: if single_position {
            PositionPolicy::SinglePosition
        } else {
            PositionPolicy::Overlapping
        },
        parallel: config.get_bool("backtest", "parallel", false),
    }
}

pub fn apply_overrides(mut config: BacktestConfig, overrides: &BacktestOverrides) -> BacktestConfig {
    if let Some(v) = overrides.stop_mult {
        config.stop_mult = v;
    }
    if let Some(v) = overrides.target_mult {
        config.target_mult = v;
    }
    if let Some(v) = overrides.trail_mult {
        config.trail_mult = v;
    }
    if overrides.single_position {
        config.policy = PositionPolicy::SinglePosition;
    }
    if overrides.parallel {
        config.parallel = true;
    }
    config
}

fn window(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ScoutError> {
    let value = config.get_int("signals", key, default as i64);
    usize::try_from(value).map_err(|_| {
        ScoutError::config_invalid("signals", key, format!("{} must be at least 1, got {}", key, value))
    })
}

pub fn build_signal_config(config: &dyn ConfigPort) -> Result<SignalConfig, ScoutError> {
    Ok(SignalConfig {
        vol_window: window(config, "vol_window", DEFAULT_VOL_WINDOW)?,
        vol_mult: config.get_double("signals", "vol_mult", DEFAULT_VOL_MULT),
        atr_window: window(config, "atr_window", DEFAULT_ATR_WINDOW)?,
    })
}

fn create_file(path: &Path) -> Result<BufWriter<File>, ScoutError> {
    Ok(BufWriter::new(File::create(path)?))
}

fn run_backtest(
    data_path: &Path,
    config_path: Option<&Path>,
    overrides: &BacktestOverrides,
    trades_out: Option<&Path>,
    details: bool,
) -> Result<(), ScoutError> {
    let adapter = load_config(config_path)?;
    let bt_config = apply_overrides(build_backtest_config(&adapter), overrides);
    validate_backtest_config(&bt_config)?;

    info!("Reading bars from {}", data_path.display());
    let bars = csv_adapter::read_bar_sequence(data_path)?;
    let result = backtest_engine::run_backtest(&bars, &bt_config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    ConsoleReport { detailed: details }.write(&result, &bt_config, &mut out)?;
    out.flush()?;

    if let Some(path) = trades_out {
        let mut file = create_file(path)?;
        TradesCsvReport.write(&result, &bt_config, &mut file)?;
        file.flush()?;
        info!("Wrote {} trades to {}", result.trades.len(), path.display());
    }

    Ok(())
}

/// Indicators and signals for `bars`, written as a signal CSV.
pub fn write_signal_file<W: Write>(
    bars: &[OhlcvBar],
    config: &SignalConfig,
    out: W,
) -> Result<Vec<Signal>, ScoutError> {
    info!("Applying technical indicators to {} bars", bars.len());
    let frame = apply_indicators(bars);

    info!("Generating trade signals");
    let crossovers = ema_crossovers(&frame);
    let signals = generate_signals(bars, &frame, config);

    let longs = signals.iter().filter(|s| **s == Signal::Long).count();
    let shorts = signals.iter().filter(|s| **s == Signal::Short).count();
    info!("{} long and {} short signals", longs, shorts);
    for (bar, signal) in bars.iter().zip(&signals).skip(bars.len().saturating_sub(5)) {
        info!("  {}  close {}  signal {}", bar.timestamp, bar.close, signal);
    }

    csv_adapter::write_signal_csv(out, bars, &frame, &crossovers, &signals)?;
    Ok(signals)
}

fn signal_pipeline(
    bars: &[OhlcvBar],
    config: &SignalConfig,
    output: &Path,
) -> Result<(), ScoutError> {
    let mut file = create_file(output)?;
    write_signal_file(bars, config, &mut file)?;
    file.flush()?;
    info!("Data with indicators and signals saved to {}", output.display());
    Ok(())
}

/// `data/BTC.csv` becomes `data/BTC_signals.csv`.
pub fn default_signal_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    input.with_file_name(format!("{}_signals.csv", stem))
}

fn run_signals(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(), ScoutError> {
    let adapter = load_config(config_path)?;
    let sig_config = build_signal_config(&adapter)?;
    validate_signal_config(&sig_config)?;

    info!("Reading OHLCV from {}", input.display());
    let bars = csv_adapter::read_ohlcv(input)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_signal_path(input));
    signal_pipeline(&bars, &sig_config, &output)
}

#[cfg(feature = "binance")]
fn network_source(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, ScoutError> {
    use crate::adapters::binance_adapter::BinanceAdapter;
    Ok(Box::new(BinanceAdapter::from_config(config)?))
}

#[cfg(not(feature = "binance"))]
fn network_source(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, ScoutError> {
    Err(ScoutError::DataSource {
        reason: "binance feature is required to fetch from the network (use --from-dir)".into(),
    })
}

fn run_fetch(
    symbol: &str,
    interval: &str,
    limit: usize,
    output: Option<&Path>,
    config_path: Option<&Path>,
    from_dir: Option<PathBuf>,
) -> Result<(), ScoutError> {
    let adapter = load_config(config_path)?;
    let sig_config = build_signal_config(&adapter)?;
    validate_signal_config(&sig_config)?;

    let source: Box<dyn DataPort> = match from_dir {
        Some(dir) => Box::new(CsvAdapter::new(dir)),
        None => network_source(&adapter)?,
    };
    let bars = source.fetch_ohlcv(symbol, interval, limit)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}_{}_{}_signals.csv", symbol, interval, limit)));
    signal_pipeline(&bars, &sig_config, &output)
}
