use crate::config::types::Price;
use crate::domain::Candle;
use crate::policy::types::{Policy, PolicyRunResult};

/// Runs every sub-policy independently over the same candle window and
/// returns whichever exits first (§4.C4.5). Ties break on list order: the
/// sub-policy listed earlier wins.
pub fn run(
    policies: &[Policy],
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    total_fee_bps: f64,
) -> PolicyRunResult {
    assert!(!policies.is_empty(), "combo policy must list at least one sub-policy");

    let mut results: Vec<PolicyRunResult> = policies
        .iter()
        .map(|p| super::executor::run_policy(p, candles, entry_idx, p0, total_fee_bps))
        .collect();

    let winner = (0..results.len())
        .min_by_key(|&i| (candles[results[i].exit_idx].timestamp_ms(), i))
        .expect("non-empty results");

    results.swap_remove(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Pct;

    fn c(ts: i64, o: f64, h: f64, l: f64, cl: f64) -> Candle {
        Candle::new(ts, o, h, l, cl, 0.0)
    }

    #[test]
    fn first_listed_policy_wins_on_exit_time_tie() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 1.0, 0.70, 0.75), // breaches both a 20% and 30% stop on the same bar
        ];
        let p0 = candles[0].close;
        let policies = vec![
            Policy::FixedStop { stop_pct: Pct::new(0.20), take_profit_pct: None },
            Policy::FixedStop { stop_pct: Pct::new(0.30), take_profit_pct: None },
        ];
        let r = run(&policies, &candles, 0, p0, 0.0);
        // first policy's stop price (0.80) is hit, not the second's (0.70)
        assert!((r.exit_price.value() - 0.80).abs() < 1e-9);
    }
}
