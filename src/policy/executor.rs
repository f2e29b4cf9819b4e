//! Policy dispatch and shared finalisation (§4.C5): locates the entry
//! candle, drives the matching state machine, then applies fees and checks
//! the cross-policy invariants (I1-I6) before handing back an
//! [`ExecutionResult`].

use crate::config::types::Price;
use crate::config::FeeConfig;
use crate::domain::Candle;
use crate::error::EngineError;
use crate::policy::types::{ExecutionResult, ExitReason, Policy, PolicyRunResult};
use crate::policy::{combo, fixed_stop, ladder, time_stop, trailing_stop, wash_rebound};

/// Dispatches to the state machine matching `policy`'s kind. Shared by the
/// top-level [`execute_policy`] and by [`combo::run`], which calls back
/// into this for each of its sub-policies. `total_fee_bps` is only
/// consumed by `wash_rebound`, whose per-leg return already folds fees in;
/// every other kind returns a pre-fee gross figure that `execute_policy`
/// finalises afterwards.
pub fn run_policy(
    policy: &Policy,
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    total_fee_bps: f64,
) -> PolicyRunResult {
    match policy {
        Policy::FixedStop { stop_pct, take_profit_pct } => {
            fixed_stop::run(candles, entry_idx, p0, **stop_pct, take_profit_pct.map(|v| *v))
        }
        Policy::TimeStop { max_hold_ms, take_profit_pct } => {
            let alert_ms = candles[entry_idx].timestamp_ms();
            time_stop::run(candles, entry_idx, p0, alert_ms, *max_hold_ms, take_profit_pct.map(|v| *v))
        }
        Policy::TrailingStop { activation_pct, trail_pct, hard_stop_pct } => trailing_stop::run(
            candles,
            entry_idx,
            p0,
            **activation_pct,
            **trail_pct,
            hard_stop_pct.map(|v| *v),
        ),
        Policy::Ladder { stop_pct, levels } => {
            ladder::run(candles, entry_idx, p0, stop_pct.map(|v| *v), levels)
        }
        Policy::Combo { policies } => combo::run(policies, candles, entry_idx, p0, total_fee_bps),
        Policy::WashRebound {
            trail_pct,
            wash_pct,
            rebound_pct,
            cooldown_candles,
            max_reentries,
        } => wash_rebound::run(
            candles,
            entry_idx,
            p0,
            **trail_pct,
            **wash_pct,
            **rebound_pct,
            *cooldown_candles,
            *max_reentries,
            total_fee_bps,
        ),
    }
}

/// Entry point for a single call (§4.C5). `alert_ms` anchors the entry
/// search; `candles` must already be restricted to the call's required
/// window (warm-up is for indicators the core doesn't compute and is
/// simply not read here).
pub fn execute_policy(
    candles: &[Candle],
    alert_ms: i64,
    policy: &Policy,
    fee: &FeeConfig,
) -> Result<ExecutionResult, EngineError> {
    let Some(entry_idx) = find_entry_index(candles, alert_ms) else {
        return Ok(ExecutionResult::no_entry());
    };
    let p0 = candles[entry_idx].close;
    if !p0.is_valid() {
        return Ok(ExecutionResult::no_entry());
    }

    let total_fee_bps = fee.total_fee_bps();
    let run_result = run_policy(policy, candles, entry_idx, p0, total_fee_bps.value());

    let net_return_bps = if run_result.fees_already_applied {
        run_result.gross_return_bps
    } else {
        run_result.gross_return_bps - crate::config::types::Bps::new(2.0 * total_fee_bps.value())
    };

    let peak_return_bps = (run_result.peak_high.value() / p0.value() - 1.0) * 10_000.0;
    let tail_capture = if peak_return_bps > 0.0 {
        Some((run_result.gross_return_bps.value() / peak_return_bps).min(1.0))
    } else {
        None
    };

    let entry_ts_ms = candles[entry_idx].timestamp_ms();
    let exit_ts_ms = candles[run_result.exit_idx].timestamp_ms();

    let result = ExecutionResult {
        realized_return_bps: net_return_bps,
        gross_return_bps: run_result.gross_return_bps,
        stop_out: matches!(
            run_result.exit_reason,
            ExitReason::StopLoss | ExitReason::HardStop | ExitReason::TrailingStop
        ),
        max_adverse_excursion_bps: run_result.max_adverse_excursion_bps,
        time_exposed_ms: exit_ts_ms - entry_ts_ms,
        tail_capture,
        entry_ts_ms,
        exit_ts_ms,
        entry_px: run_result.entry_price,
        exit_px: run_result.exit_price,
        exit_reason: run_result.exit_reason,
    };

    check_invariants(&result, peak_return_bps, run_result.exit_idx, candles.len(), run_result.ladder_fraction_total)?;
    Ok(result)
}

fn find_entry_index(candles: &[Candle], alert_ms: i64) -> Option<usize> {
    let idx = candles.partition_point(|c| c.timestamp_ms() < alert_ms);
    if idx < candles.len() {
        Some(idx)
    } else {
        None
    }
}

const INVARIANT_EPSILON_BPS: f64 = 1e-6;

fn check_invariants(
    result: &ExecutionResult,
    peak_return_bps: f64,
    exit_idx: usize,
    candles_len: usize,
    ladder_fraction_total: Option<f64>,
) -> Result<(), EngineError> {
    if result.realized_return_bps.value() > peak_return_bps + INVARIANT_EPSILON_BPS {
        return Err(EngineError::InvariantViolation(format!(
            "I1: realized return {} exceeds peak {}",
            result.realized_return_bps.value(),
            peak_return_bps
        )));
    }
    if let Some(tc) = result.tail_capture {
        if !(-INVARIANT_EPSILON_BPS..=1.0 + INVARIANT_EPSILON_BPS).contains(&tc) {
            return Err(EngineError::InvariantViolation(format!(
                "I2: tail capture {tc} out of [0, 1]"
            )));
        }
    }
    if result.entry_ts_ms > result.exit_ts_ms {
        return Err(EngineError::InvariantViolation(
            "I3: entry after exit".to_string(),
        ));
    }
    if result.exit_ts_ms - result.entry_ts_ms != result.time_exposed_ms {
        return Err(EngineError::InvariantViolation(
            "I3: time exposed does not match entry/exit delta".to_string(),
        ));
    }
    if result.max_adverse_excursion_bps.value() > INVARIANT_EPSILON_BPS {
        return Err(EngineError::InvariantViolation(format!(
            "I5: max adverse excursion {} is positive",
            result.max_adverse_excursion_bps.value()
        )));
    }
    if exit_idx >= candles_len {
        return Err(EngineError::InvariantViolation(format!(
            "I4: exit index {exit_idx} reads past the supplied window of {candles_len} candles"
        )));
    }
    if let Some(total) = ladder_fraction_total {
        if (total - 1.0).abs() > INVARIANT_EPSILON_BPS {
            return Err(EngineError::InvariantViolation(format!(
                "I6: ladder fraction total {total} does not sum to 1"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod executor_tests;
