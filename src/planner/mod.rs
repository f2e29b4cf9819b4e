//! Derives per-call candle windows from a strategy spec and partitions
//! calls into eligible/excluded via the coverage gate (§4.C6).

pub mod coverage;

pub use coverage::{gate_coverage, CoverageResult, ExclusionReason};

use crate::config::StrategySpec;
use crate::domain::Call;
use crate::store::slice::CallWindow;

/// Derives `[required_from_ms, required_to_ms]` for one call: warm-up and
/// entry-delay bars look backward from the alert, `max_hold_ms` bounds how
/// far forward any policy may run.
pub fn plan_window(call: &Call, strategy: &StrategySpec) -> CallWindow {
    let lookback_ms = strategy.warmup_ms() + strategy.entry_delay_ms();
    CallWindow {
        call_id: call.id.clone(),
        token: call.mint.clone(),
        chain: call.chain.clone(),
        interval: strategy.interval,
        from_ms: call.alert_ts_ms - lookback_ms,
        to_ms: call.alert_ts_ms + strategy.max_hold_ms,
    }
}

pub fn plan_windows(calls: &[Call], strategy: &StrategySpec) -> Vec<CallWindow> {
    calls.iter().map(|c| plan_window(c, strategy)).collect()
}
