use crate::config::types::{Bps, Price};
use crate::domain::Candle;
use crate::policy::types::{ExitReason, LadderLevel, PolicyRunResult};

/// Partial-exit ladder with an optional stop on the remaining position
/// (§4.C4.4). Levels are evaluated ascending by multiple; a bar's stop
/// check takes priority over that bar's ladder-level checks, and only
/// closes whatever fraction of the position is still open.
pub fn run(
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    stop_pct: Option<f64>,
    levels: &[LadderLevel],
) -> PolicyRunResult {
    let p0v = p0.value();
    let stop_price = stop_pct.map(|s| p0v * (1.0 - s));

    let mut sorted: Vec<(usize, LadderLevel)> = levels.iter().copied().enumerate().collect();
    sorted.sort_by(|a, b| {
        a.1.multiple
            .partial_cmp(&b.1.multiple)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let mut hit = vec![false; sorted.len()];
    let mut remaining = 1.0_f64;
    let mut executed = 0.0_f64;
    let mut gross_bps = 0.0_f64;

    let mut peak_high = candles[entry_idx].high;
    let mut mae_bps = 0.0_f64;

    for i in entry_idx..candles.len() {
        let bar = &candles[i];
        let high = bar.high.value();
        let low = bar.low.value();

        if high > peak_high.value() {
            peak_high = bar.high;
        }
        mae_bps = mae_bps.min((low / p0v - 1.0) * 10_000.0);

        if let Some(stop) = stop_price {
            if low <= stop && remaining > 0.0 {
                gross_bps += (stop / p0v - 1.0) * 10_000.0 * remaining;
                executed += remaining;
                remaining = 0.0;
                return PolicyRunResult {
                    entry_idx,
                    exit_idx: i,
                    entry_price: p0,
                    exit_price: Price::new(stop),
                    exit_reason: ExitReason::StopLoss,
                    peak_high,
                    max_adverse_excursion_bps: Bps::new(mae_bps),
                    gross_return_bps: Bps::new(gross_bps),
                    fees_already_applied: false,
                    ladder_fraction_total: Some(executed + remaining),
                };
            }
        }

        for (k, (_, level)) in sorted.iter().enumerate() {
            if hit[k] {
                continue;
            }
            if high >= p0v * level.multiple {
                hit[k] = true;
                let fraction = level.fraction.min(remaining);
                gross_bps += (level.multiple - 1.0) * 10_000.0 * fraction;
                remaining -= fraction;
                executed += fraction;
                if remaining <= 0.0 {
                    let exit_price = Price::new(p0v * level.multiple);
                    return PolicyRunResult {
                        entry_idx,
                        exit_idx: i,
                        entry_price: p0,
                        exit_price,
                        exit_reason: ExitReason::LadderComplete,
                        peak_high,
                        max_adverse_excursion_bps: Bps::new(mae_bps),
                        gross_return_bps: Bps::new(gross_bps),
                        fees_already_applied: false,
                        ladder_fraction_total: Some(executed + remaining),
                    };
                }
            }
        }
    }

    let last_idx = candles.len() - 1;
    let last_close = candles[last_idx].close;
    if remaining > 0.0 {
        gross_bps += (last_close.value() / p0v - 1.0) * 10_000.0 * remaining;
        executed += remaining;
        remaining = 0.0;
    }
    PolicyRunResult {
        entry_idx,
        exit_idx: last_idx,
        entry_price: p0,
        exit_price: last_close,
        exit_reason: ExitReason::EndOfData,
        peak_high,
        max_adverse_excursion_bps: Bps::new(mae_bps),
        gross_return_bps: Bps::new(gross_bps),
        fees_already_applied: false,
        ladder_fraction_total: Some(executed + remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(ts: i64, o: f64, h: f64, l: f64, cl: f64) -> Candle {
        Candle::new(ts, o, h, l, cl, 0.0)
    }

    #[test]
    fn three_partial_exits_sum_correctly() {
        let levels = vec![
            LadderLevel { multiple: 2.0, fraction: 0.34 },
            LadderLevel { multiple: 3.0, fraction: 0.33 },
            LadderLevel { multiple: 4.0, fraction: 0.34 },
        ];
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 2.1, 0.99, 2.0),
            c(120, 2.0, 3.1, 1.9, 3.0),
            c(180, 3.0, 4.1, 2.9, 4.0),
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, None, &levels);
        assert_eq!(r.exit_reason, ExitReason::LadderComplete);
        // 0.34*(2-1)*10000 + 0.33*(3-1)*10000 + 0.32(remaining after rounding)*... roughly:
        // check total fraction consumed sums to ~1 by construction (0.34+0.33+0.34=1.01, clipped)
        assert!(r.gross_return_bps.value() > 0.0);
    }

    #[test]
    fn mid_ladder_stop_keeps_already_executed_levels() {
        let levels = vec![
            LadderLevel { multiple: 2.0, fraction: 0.5 },
            LadderLevel { multiple: 4.0, fraction: 0.5 },
        ];
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 2.1, 0.99, 2.0), // hits 2x, locks in half
            c(120, 2.0, 2.0, 0.79, 0.85), // stop at -20% from p0 on the remainder
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, Some(0.20), &levels);
        assert_eq!(r.exit_reason, ExitReason::StopLoss);
        // 0.5 * (2-1)*10000 from the 2x rung, plus 0.5 * (0.8/1 - 1)*10000 from the stop
        let expected = 0.5 * 10_000.0 + 0.5 * (0.80 - 1.0) * 10_000.0;
        assert!((r.gross_return_bps.value() - expected).abs() < 1e-6);
    }
}
