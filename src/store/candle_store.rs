use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::{Candle, Interval};
use crate::error::{EngineError, EngineResult};

/// Read-only windowed candle accessor (§4.C1). The concrete storage engine
/// behind a production implementation (SQL, parquet, ...) is out of scope;
/// this crate ships only the port and an in-process implementation used
/// both as the production cache fed by an upstream ingester and as the
/// fixture backing tests.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Chronologically sorted, deduplicated bars for `(token, chain,
    /// interval)` restricted to `[from_ms, to_ms]`.
    async fn candles(
        &self,
        token: &str,
        chain: &str,
        interval: Interval,
        from_ms: i64,
        to_ms: i64,
    ) -> EngineResult<Vec<Candle>>;

    /// Whether the full window is covered, without materialising it.
    async fn has_coverage(
        &self,
        token: &str,
        chain: &str,
        interval: Interval,
        from_ms: i64,
        to_ms: i64,
    ) -> EngineResult<bool>;
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
struct SeriesKey {
    token: String,
    chain: String,
    interval_ms: i64,
}

/// In-memory candle store keyed by `(token, chain, interval)`. Doubles as
/// the test/fixture store (§10.5): built directly from a `Vec<Candle>` per
/// series, no I/O.
#[derive(Debug, Default)]
pub struct InMemoryCandleStore {
    series: BTreeMap<SeriesKey, Vec<Candle>>,
}

impl InMemoryCandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) the candle series for one `(token, chain,
    /// interval)`. Candles are sorted and deduplicated by timestamp on
    /// insert so later reads never have to re-check ordering.
    pub fn insert(&mut self, token: impl Into<String>, chain: impl Into<String>, interval: Interval, mut candles: Vec<Candle>) {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        self.series.insert(
            SeriesKey { token: token.into(), chain: chain.into(), interval_ms: interval.to_ms() },
            candles,
        );
    }

    fn lookup(&self, token: &str, chain: &str, interval: Interval) -> Option<&[Candle]> {
        self.series
            .get(&SeriesKey { token: token.to_string(), chain: chain.to_string(), interval_ms: interval.to_ms() })
            .map(Vec::as_slice)
    }
}

#[async_trait]
impl CandleStore for InMemoryCandleStore {
    async fn candles(
        &self,
        token: &str,
        chain: &str,
        interval: Interval,
        from_ms: i64,
        to_ms: i64,
    ) -> EngineResult<Vec<Candle>> {
        let Some(series) = self.lookup(token, chain, interval) else {
            return Err(EngineError::NoCoverage {
                call_id: format!("{token}@{chain}"),
                from_ms,
                to_ms,
            });
        };
        Ok(series
            .iter()
            .filter(|c| c.timestamp_ms() >= from_ms && c.timestamp_ms() <= to_ms)
            .copied()
            .collect())
    }

    async fn has_coverage(
        &self,
        token: &str,
        chain: &str,
        interval: Interval,
        from_ms: i64,
        to_ms: i64,
    ) -> EngineResult<bool> {
        let Some(series) = self.lookup(token, chain, interval) else {
            return Ok(false);
        };
        let Some(first) = series.first() else {
            return Ok(false);
        };
        let Some(last) = series.last() else {
            return Ok(false);
        };
        Ok(first.timestamp_ms() <= from_ms && last.timestamp_ms() >= to_ms)
    }
}
