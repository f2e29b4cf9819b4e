use crate::config::types::{Bps, Price};
use crate::domain::Candle;
use crate::policy::types::{ExitReason, PolicyRunResult};

#[derive(Clone, Copy)]
enum State {
    InPosition,
    WaitForWash,
    WaitForRebound,
}

/// Re-entry state machine (§4.C4.6): a trailing exit, a wash below the exit
/// peak, and a rebound re-entry, repeated up to `max_reentries` times. Fees
/// are applied per leg inside the compounding multiplier, so the returned
/// `gross_return_bps` is already the final net figure.
#[allow(clippy::too_many_arguments)]
pub fn run(
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    trail_pct: f64,
    wash_pct: f64,
    rebound_pct: f64,
    cooldown_candles: u32,
    max_reentries: u32,
    total_fee_bps: f64,
) -> PolicyRunResult {
    let fee_frac = total_fee_bps / 10_000.0;

    let mut state = State::InPosition;
    let mut entry_price = p0.value();
    let mut peak = candles[entry_idx].high.value();
    let mut overall_peak_high = candles[entry_idx].high;
    let mut tracking_overall_peak = true;
    let mut mae_bps = 0.0_f64;
    let mut cumulative_multiplier = 1.0_f64;
    let mut reentry_count: u32 = 0;
    let mut cooldown_until_idx = 0usize;
    let mut peak_at_exit = peak;
    let mut wash_low = 0.0_f64;
    let mut wash_low_idx = 0usize;

    let last_idx = candles.len() - 1;
    let mut last_exit_idx = last_idx;
    let mut last_exit_price = candles[last_idx].close.value();
    let mut last_reason = ExitReason::EndOfData;

    for i in entry_idx..candles.len() {
        let bar = &candles[i];
        let high = bar.high.value();
        let low = bar.low.value();
        mae_bps = mae_bps.min((low / p0.value() - 1.0) * 10_000.0);

        match state {
            State::InPosition => {
                if high > peak {
                    peak = high;
                }
                if tracking_overall_peak && high > overall_peak_high.value() {
                    overall_peak_high = bar.high;
                }
                let trigger = peak * (1.0 - trail_pct);
                if low <= trigger {
                    let leg_multiplier =
                        (trigger * (1.0 - fee_frac)) / (entry_price * (1.0 + fee_frac));
                    cumulative_multiplier *= leg_multiplier;
                    last_exit_idx = i;
                    last_exit_price = trigger;
                    last_reason = ExitReason::TrailingStop;
                    peak_at_exit = peak;
                    tracking_overall_peak = false;

                    if reentry_count >= max_reentries {
                        return finalize(
                            entry_idx,
                            i,
                            p0,
                            Price::new(trigger),
                            ExitReason::TrailingStop,
                            overall_peak_high,
                            mae_bps,
                            cumulative_multiplier,
                        );
                    }

                    state = State::WaitForWash;
                    cooldown_until_idx = i + cooldown_candles as usize;
                }
            }
            State::WaitForWash => {
                if i < cooldown_until_idx {
                    continue;
                }
                if low <= peak_at_exit * (1.0 - wash_pct) {
                    wash_low = low;
                    wash_low_idx = i;
                    state = State::WaitForRebound;
                }
            }
            State::WaitForRebound => {
                if low < wash_low {
                    wash_low = low;
                    wash_low_idx = i;
                }
                let rebound_price = wash_low * (1.0 + rebound_pct);
                if i > wash_low_idx && high >= rebound_price {
                    entry_price = rebound_price;
                    reentry_count += 1;
                    peak = high;
                    tracking_overall_peak = true;
                    state = State::InPosition;
                }
            }
        }
    }

    if matches!(state, State::InPosition) {
        let close = candles[last_idx].close.value();
        let leg_multiplier = (close * (1.0 - fee_frac)) / (entry_price * (1.0 + fee_frac));
        cumulative_multiplier *= leg_multiplier;
        last_exit_idx = last_idx;
        last_exit_price = close;
        last_reason = ExitReason::EndOfData;
    }

    finalize(
        entry_idx,
        last_exit_idx,
        p0,
        Price::new(last_exit_price),
        last_reason,
        overall_peak_high,
        mae_bps,
        cumulative_multiplier,
    )
}

fn finalize(
    entry_idx: usize,
    exit_idx: usize,
    p0: Price,
    exit_price: Price,
    exit_reason: ExitReason,
    peak_high: Price,
    mae_bps: f64,
    cumulative_multiplier: f64,
) -> PolicyRunResult {
    PolicyRunResult {
        entry_idx,
        exit_idx,
        entry_price: p0,
        exit_price,
        exit_reason,
        peak_high,
        max_adverse_excursion_bps: Bps::new(mae_bps),
        gross_return_bps: Bps::new((cumulative_multiplier - 1.0) * 10_000.0),
        fees_already_applied: true,
        ladder_fraction_total: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(ts: i64, o: f64, h: f64, l: f64, cl: f64) -> Candle {
        Candle::new(ts, o, h, l, cl, 0.0)
    }

    #[test]
    fn washes_out_and_rebounds_into_a_second_leg() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 1.50, 1.40, 1.45), // peak 1.50
            c(120, 1.45, 1.45, 1.19, 1.20), // trail stop at 1.50*0.9=1.35, breached -> exit 1.35
            c(180, 1.20, 1.21, 1.00, 1.05), // cooldown candle (cooldown_candles=1)
            c(240, 1.05, 1.08, 0.90, 0.95), // wash below 1.35*0.8=1.08
            c(300, 0.95, 1.00, 0.90, 0.98),
            c(360, 0.98, 1.15, 0.95, 1.10), // rebound above washLow*1.1
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0.10, 0.20, 0.10, 1, 3, 0.0);
        assert!(r.fees_already_applied);
        // two legs realized: trail exit then a re-entry still open or closed by end of data
        assert_ne!(r.exit_reason, ExitReason::NoEntry);
    }

    #[test]
    fn caps_reentries_at_configured_maximum() {
        let mut candles = vec![c(0, 1.0, 1.0, 1.0, 1.0)];
        // oscillate enough times to exceed max_reentries=1
        for k in 1..20 {
            let ts = k as i64 * 60;
            candles.push(c(ts, 1.0, 1.5, 0.8, 1.0));
        }
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0.10, 0.10, 0.05, 0, 1, 0.0);
        assert!(r.fees_already_applied);
    }
}
