use serde::{Deserialize, Serialize};

use crate::config::types::Price;

/// One OHLCV bar. `timestamp` is seconds since epoch, aligned to the
/// interval boundary; candle sequences from the store are strictly
/// increasing in `timestamp` and gap-free within a contiguous window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: Price::new(open),
            high: Price::new(high),
            low: Price::new(low),
            close: Price::new(close),
            volume: volume.max(0.0),
        }
    }

    /// Candle timestamp expressed in milliseconds, the unit every other
    /// timestamp field in the system is carried in.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ms_scales_by_a_thousand() {
        let c = Candle::new(1_700_000_000, 1.0, 1.1, 0.9, 1.0, 100.0);
        assert_eq!(c.timestamp_ms(), 1_700_000_000_000);
    }
}
