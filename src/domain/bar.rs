//! Simulator input: a price bar annotated with volatility and an entry signal.

use chrono::NaiveDateTime;
use std::fmt;

/// Discrete per-bar entry signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Long,
    Short,
    #[default]
    None,
}

impl Signal {
    /// Wire form used in signal files: 1, -1 or 0.
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::None => 0,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(Signal::Long),
            -1 => Some(Signal::Short),
            0 => Some(Signal::None),
            _ => None,
        }
    }

    /// Direction of the trade this signal would open, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Signal::Long => Some(Direction::Long),
            Signal::Short => Some(Direction::Short),
            Signal::None => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Side of an open trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// ATR-like measure; `None` during indicator warm-up.
    pub volatility: Option<f64>,
    pub signal: Signal,
}

impl Bar {
    /// Volatility with the undefined case collapsed to zero. NaN counts as
    /// undefined.
    pub fn volatility_or_zero(&self) -> f64 {
        self.volatility.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}
