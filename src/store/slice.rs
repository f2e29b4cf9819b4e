use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Interval};
use crate::error::EngineResult;
use crate::fingerprint::sha256_hex;
use crate::store::CandleStore;

/// One call's window: the planner's output feeding the slice materialiser.
#[derive(Debug, Clone)]
pub struct CallWindow {
    pub call_id: String,
    pub token: String,
    pub chain: String,
    pub interval: Interval,
    pub from_ms: i64,
    pub to_ms: i64,
}

/// Consolidated, call-grouped candle slice (§4.C7): everything a run loop
/// needs to replay every eligible call without going back to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slice {
    pub key: String,
    pub rows: Vec<(String, Vec<Candle>)>,
}

impl Slice {
    pub fn candles_for(&self, call_id: &str) -> Option<&[Candle]> {
        self.rows
            .iter()
            .find(|(id, _)| id == call_id)
            .map(|(_, candles)| candles.as_slice())
    }

    pub fn to_bincode(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bincode(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Content-addressing key for a slice: a hash of the sorted call-ids plus
/// the dataset bounds and interval (§10.7), so an identical request always
/// names the same slice.
pub fn slice_key(call_ids: &[String], from_ms: i64, to_ms: i64, interval: Interval) -> String {
    let mut sorted = call_ids.to_vec();
    sorted.sort();
    let canonical = format!("{sorted:?}|{from_ms}|{to_ms}|{interval}");
    sha256_hex(canonical.as_bytes())
}

/// Builds a slice by reading each call's window from `store` (§4.C7). Only
/// ever called for calls the coverage gate already marked eligible.
pub async fn materialize_slice(
    store: &dyn CandleStore,
    windows: &[CallWindow],
) -> EngineResult<Slice> {
    let mut rows = Vec::with_capacity(windows.len());
    let mut bounds: Option<(i64, i64)> = None;
    let mut interval = None;
    let mut call_ids = Vec::with_capacity(windows.len());

    for w in windows {
        let candles = store
            .candles(&w.token, &w.chain, w.interval, w.from_ms, w.to_ms)
            .await?;
        rows.push((w.call_id.clone(), candles));
        call_ids.push(w.call_id.clone());
        interval = Some(w.interval);
        bounds = Some(match bounds {
            None => (w.from_ms, w.to_ms),
            Some((lo, hi)) => (lo.min(w.from_ms), hi.max(w.to_ms)),
        });
    }

    let (from_ms, to_ms) = bounds.unwrap_or((0, 0));
    let key = slice_key(&call_ids, from_ms, to_ms, interval.unwrap_or(Interval::M1));

    Ok(Slice { key, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCandleStore;

    fn c(ts: i64) -> Candle {
        Candle::new(ts, 1.0, 1.0, 1.0, 1.0, 0.0)
    }

    #[test]
    fn slice_key_is_order_independent_in_call_ids() {
        let a = slice_key(&["b".into(), "a".into()], 0, 100, Interval::M1);
        let b = slice_key(&["a".into(), "b".into()], 0, 100, Interval::M1);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn materialises_one_row_per_window() {
        let mut store = InMemoryCandleStore::new();
        store.insert("MINT", "sol", Interval::M1, vec![c(0), c(60)]);
        let windows = vec![CallWindow {
            call_id: "call-1".into(),
            token: "MINT".into(),
            chain: "sol".into(),
            interval: Interval::M1,
            from_ms: 0,
            to_ms: 60_000,
        }];
        let slice = materialize_slice(&store, &windows).await.unwrap();
        assert_eq!(slice.rows.len(), 1);
        assert_eq!(slice.candles_for("call-1").unwrap().len(), 2);
    }

    #[test]
    fn round_trips_through_bincode() {
        let slice = Slice {
            key: "abc".into(),
            rows: vec![("call-1".into(), vec![c(0)])],
        };
        let bytes = slice.to_bincode().unwrap();
        let back = Slice::from_bincode(&bytes).unwrap();
        assert_eq!(back.key, slice.key);
    }
}
