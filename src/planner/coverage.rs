use serde::{Deserialize, Serialize};

use crate::store::candle_store::CandleStore;
use crate::store::slice::CallWindow;

/// Why a call was excluded before any candle was read for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionReason {
    MissingRange,
    NoCandles,
    UnsupportedChain,
    InvalidAnchor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Excluded {
    pub call_id: String,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageResult {
    pub eligible: Vec<CallWindowOwned>,
    pub excluded: Vec<Excluded>,
}

/// `CallWindow` is not `Serialize`-friendly as-is (it borrows nothing, but
/// we want the coverage result to round-trip for the manifest), so this is
/// a plain owned mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallWindowOwned {
    pub call_id: String,
    pub token: String,
    pub chain: String,
    pub interval: crate::domain::Interval,
    pub from_ms: i64,
    pub to_ms: i64,
}

impl From<&CallWindow> for CallWindowOwned {
    fn from(w: &CallWindow) -> Self {
        Self {
            call_id: w.call_id.clone(),
            token: w.token.clone(),
            chain: w.chain.clone(),
            interval: w.interval,
            from_ms: w.from_ms,
            to_ms: w.to_ms,
        }
    }
}

/// Partitions `windows` into eligible and excluded without reading any
/// candle payloads, only asking the store an existence question (§4.C6).
pub async fn gate_coverage(
    store: &dyn CandleStore,
    windows: &[CallWindow],
) -> CoverageResult {
    let mut eligible = Vec::new();
    let mut excluded = Vec::new();

    for w in windows {
        if w.from_ms > w.to_ms {
            excluded.push(Excluded {
                call_id: w.call_id.clone(),
                reason: ExclusionReason::InvalidAnchor,
            });
            continue;
        }

        match store.has_coverage(&w.token, &w.chain, w.interval, w.from_ms, w.to_ms).await {
            Ok(true) => eligible.push(CallWindowOwned::from(w)),
            Ok(false) => excluded.push(Excluded {
                call_id: w.call_id.clone(),
                reason: ExclusionReason::MissingRange,
            }),
            Err(_) => excluded.push(Excluded {
                call_id: w.call_id.clone(),
                reason: ExclusionReason::NoCandles,
            }),
        }
    }

    CoverageResult { eligible, excluded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, Interval};
    use crate::store::InMemoryCandleStore;

    fn c(ts: i64) -> Candle {
        Candle::new(ts, 1.0, 1.0, 1.0, 1.0, 0.0)
    }

    #[tokio::test]
    async fn partitions_eligible_and_excluded() {
        let mut store = InMemoryCandleStore::new();
        store.insert("MINT", "sol", Interval::M1, vec![c(0), c(60)]);

        let windows = vec![
            CallWindow {
                call_id: "covered".into(),
                token: "MINT".into(),
                chain: "sol".into(),
                interval: Interval::M1,
                from_ms: 0,
                to_ms: 60_000,
            },
            CallWindow {
                call_id: "missing".into(),
                token: "OTHER".into(),
                chain: "sol".into(),
                interval: Interval::M1,
                from_ms: 0,
                to_ms: 60_000,
            },
            CallWindow {
                call_id: "inverted".into(),
                token: "MINT".into(),
                chain: "sol".into(),
                interval: Interval::M1,
                from_ms: 60_000,
                to_ms: 0,
            },
        ];

        let result = gate_coverage(&store, &windows).await;
        assert_eq!(result.eligible.len(), 1);
        assert_eq!(result.eligible[0].call_id, "covered");
        assert_eq!(result.excluded.len(), 2);
    }
}
