use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Interval};
use crate::store::candle_store::InMemoryCandleStore;

/// One series of an on-disk candle fixture (§10.5): everything
/// `InMemoryCandleStore::insert` needs for one `(token, chain, interval)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSeries {
    pub token: String,
    pub chain: String,
    pub interval: Interval,
    pub candles: Vec<Candle>,
}

/// The on-disk shape consumed by the CLI's `--candles` argument and
/// produced by `make_fixture`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureFile {
    pub series: Vec<FixtureSeries>,
}

impl FixtureFile {
    pub fn into_store(self) -> InMemoryCandleStore {
        let mut store = InMemoryCandleStore::new();
        for s in self.series {
            store.insert(s.token, s.chain, s.interval, s.candles);
        }
        store
    }
}

/// Builds direction-aware candles from a list of closes: each candle's
/// open is the prior candle's close (the first candle opens at its own
/// close). The wick is one-sided: an up candle's high extends `wick_pct`
/// above `max(open, close)` while its low sits exactly at `min(open,
/// close)` with no wick, and a down candle is the mirror image (§8's
/// worked scenarios).
pub struct FixtureBuilder {
    start_ts: i64,
    interval: Interval,
    wick_pct: f64,
}

impl FixtureBuilder {
    pub fn new(start_ts: i64, interval: Interval) -> Self {
        Self { start_ts, interval, wick_pct: 0.01 }
    }

    pub fn with_wick_pct(mut self, wick_pct: f64) -> Self {
        self.wick_pct = wick_pct;
        self
    }

    pub fn build(&self, closes: &[f64]) -> Vec<Candle> {
        let step_s = self.interval.to_ms() / 1_000;
        let mut candles = Vec::with_capacity(closes.len());
        let mut prev_close = closes.first().copied().unwrap_or(0.0);

        for (i, &close) in closes.iter().enumerate() {
            let open = if i == 0 { close } else { prev_close };
            let (high, low) = if close >= open {
                (close * (1.0 + self.wick_pct), open)
            } else {
                (open, close * (1.0 - self.wick_pct))
            };
            candles.push(Candle::new(self.start_ts + i as i64 * step_s, open, high, low, close, 0.0));
            prev_close = close;
        }
        candles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_chains_to_prior_close() {
        let candles = FixtureBuilder::new(0, Interval::M1).build(&[1.0, 1.5, 1.2]);
        assert_eq!(candles[1].open.value(), 1.0);
        assert_eq!(candles[2].open.value(), 1.5);
    }

    #[test]
    fn wick_brackets_the_move_direction() {
        let candles = FixtureBuilder::new(0, Interval::M1).with_wick_pct(0.01).build(&[1.0, 2.0, 1.2]);
        let up = &candles[1];
        assert!((up.high.value() - up.close.value() * 1.01).abs() < 1e-9);
        assert_eq!(up.low.value(), up.open.value());

        let down = &candles[2];
        assert_eq!(down.high.value(), down.open.value());
        assert!((down.low.value() - down.close.value() * 0.99).abs() < 1e-9);
    }

    #[test]
    fn fixture_file_round_trips_into_a_store() {
        let file = FixtureFile {
            series: vec![FixtureSeries {
                token: "MINT".into(),
                chain: "sol".into(),
                interval: Interval::M1,
                candles: FixtureBuilder::new(0, Interval::M1).build(&[1.0, 1.1]),
            }],
        };
        let json = serde_json::to_string(&file).unwrap();
        let back: FixtureFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.series.len(), 1);
        let _store = back.into_store();
    }
}
