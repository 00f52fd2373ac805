//! Market data port trait.

use crate::domain::error::ScoutError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// The most recent `limit` candles for `symbol` at `interval`, oldest first.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScoutError>;
}
