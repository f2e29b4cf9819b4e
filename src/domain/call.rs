use serde::{Deserialize, Serialize};

/// A timestamped alert on a token, as produced by an upstream ingester.
/// Read-only to the core; created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub caller: String,
    pub mint: String,
    pub chain: String,
    pub alert_ts_ms: i64,
}

impl Call {
    pub fn new(
        id: impl Into<String>,
        caller: impl Into<String>,
        mint: impl Into<String>,
        chain: impl Into<String>,
        alert_ts_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            caller: caller.into(),
            mint: mint.into(),
            chain: chain.into(),
            alert_ts_ms,
        }
    }
}
