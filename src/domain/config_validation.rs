//! Configuration validation.
//!
//! Runs on the merged configuration (file values plus CLI overrides), before
//! any data is loaded.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::ScoutError;
use crate::domain::signals::SignalConfig;

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), ScoutError> {
    validate_positive("stop_mult", config.stop_mult)?;
    validate_positive("target_mult", config.target_mult)?;
    validate_trail_mult(config.trail_mult)?;
    Ok(())
}

pub fn validate_signal_config(config: &SignalConfig) -> Result<(), ScoutError> {
    validate_window("vol_window", config.vol_window)?;
    validate_window("atr_window", config.atr_window)?;
    validate_vol_mult(config.vol_mult)?;
    Ok(())
}

fn validate_positive(key: &str, value: f64) -> Result<(), ScoutError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ScoutError::config_invalid(
            "backtest",
            key,
            format!("{} must be a positive number, got {}", key, value),
        ));
    }
    Ok(())
}

fn validate_trail_mult(value: f64) -> Result<(), ScoutError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScoutError::config_invalid(
            "backtest",
            "trail_mult",
            format!("trail_mult must be non-negative, got {}", value),
        ));
    }
    Ok(())
}

fn validate_window(key: &str, value: usize) -> Result<(), ScoutError> {
    if value == 0 {
        return Err(ScoutError::config_invalid(
            "signals",
            key,
            format!("{} must be at least 1", key),
        ));
    }
    Ok(())
}

fn validate_vol_mult(value: f64) -> Result<(), ScoutError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScoutError::config_invalid(
            "signals",
            "vol_mult",
            format!("vol_mult must be non-negative, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backtest(stop: f64, target: f64, trail: f64) -> BacktestConfig {
        BacktestConfig {
            stop_mult: stop,
            target_mult: target,
            trail_mult: trail,
            ..BacktestConfig::default()
        }
    }

    fn assert_invalid_key(result: Result<(), ScoutError>, expected: &str) {
        match result {
            Err(ScoutError::ConfigInvalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_backtest_config(&BacktestConfig::default()).is_ok());
        assert!(validate_signal_config(&SignalConfig::default()).is_ok());
    }

    #[test]
    fn zero_trail_is_valid() {
        assert!(validate_backtest_config(&backtest(1.0, 1.0, 0.0)).is_ok());
    }

    #[test]
    fn rejects_non_positive_stop() {
        assert_invalid_key(validate_backtest_config(&backtest(0.0, 1.0, 0.5)), "stop_mult");
        assert_invalid_key(validate_backtest_config(&backtest(-1.0, 1.0, 0.5)), "stop_mult");
    }

    #[test]
    fn rejects_non_positive_target() {
        assert_invalid_key(validate_backtest_config(&backtest(1.0, 0.0, 0.5)), "target_mult");
    }

    #[test]
    fn rejects_negative_trail() {
        assert_invalid_key(validate_backtest_config(&backtest(1.0, 1.0, -0.1)), "trail_mult");
    }

    #[test]
    fn rejects_nan() {
        assert_invalid_key(validate_backtest_config(&backtest(f64::NAN, 1.0, 0.5)), "stop_mult");
        assert_invalid_key(
            validate_backtest_config(&backtest(1.0, 1.0, f64::INFINITY)),
            "trail_mult",
        );
    }

    #[test]
    fn rejects_zero_windows() {
        let config = SignalConfig {
            vol_window: 0,
            ..SignalConfig::default()
        };
        assert_invalid_key(validate_signal_config(&config), "vol_window");

        let config = SignalConfig {
            atr_window: 0,
            ..SignalConfig::default()
        };
        assert_invalid_key(validate_signal_config(&config), "atr_window");
    }

    #[test]
    fn rejects_negative_vol_mult() {
        let config = SignalConfig {
            vol_mult: -1.0,
            ..SignalConfig::default()
        };
        assert_invalid_key(validate_signal_config(&config), "vol_mult");
    }
}
