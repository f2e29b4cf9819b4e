use serde::{Deserialize, Serialize};

use crate::domain::Interval;
use crate::policy::Policy;

/// Derives the per-call candle window: warm-up and entry-delay bars look
/// backward from the alert, `max_hold_ms` bounds how far forward a policy
/// may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySpec {
    pub interval: Interval,
    #[serde(default)]
    pub indicator_warmup_bars: i64,
    #[serde(default)]
    pub entry_delay_bars: i64,
    pub max_hold_ms: i64,
    pub policies: Vec<Policy>,
}

impl StrategySpec {
    pub fn warmup_ms(&self) -> i64 {
        self.indicator_warmup_bars * self.interval.to_ms()
    }

    pub fn entry_delay_ms(&self) -> i64 {
        self.entry_delay_bars * self.interval.to_ms()
    }
}

/// The axes enumerated by the scenario sweep driver (interval × entry-lag ×
/// policy set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepAxes {
    pub intervals: Vec<Interval>,
    pub entry_lags_ms: Vec<i64>,
    pub policy_sets: Vec<PolicySet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySet {
    pub id: String,
    pub policies: Vec<Policy>,
}
