use crate::config::types::{Bps, Price};
use crate::domain::Candle;
use crate::policy::fixed_stop::end_of_data;
use crate::policy::types::{ExitReason, PolicyRunResult};

/// Activation threshold, then a trailing stop off the running peak, with an
/// optional hard stop below entry (§4.C4.3). Bar priority: hard stop, then
/// activation/trail update, then trail-stop check — all within the same
/// bar, in that order.
pub fn run(
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    activation_pct: f64,
    trail_pct: f64,
    hard_stop_pct: Option<f64>,
) -> PolicyRunResult {
    let p0v = p0.value();
    let activation_price = p0v * (1.0 + activation_pct);
    let hard_stop_price = hard_stop_pct.map(|h| p0v * (1.0 - h));

    let mut peak_high = candles[entry_idx].high;
    let mut mae_bps = 0.0_f64;

    let mut active = false;
    let mut trail_peak = 0.0_f64;
    let mut trail_stop_price = 0.0_f64;

    for i in entry_idx..candles.len() {
        let bar = &candles[i];
        let high = bar.high.value();
        let low = bar.low.value();

        if high > peak_high.value() {
            peak_high = bar.high;
        }
        mae_bps = mae_bps.min((low / p0v - 1.0) * 10_000.0);

        if let Some(hard_stop) = hard_stop_price {
            if low <= hard_stop {
                return terminal(
                    entry_idx,
                    i,
                    p0,
                    Price::new(hard_stop),
                    ExitReason::HardStop,
                    peak_high,
                    mae_bps,
                );
            }
        }

        if !active && high >= activation_price {
            active = true;
            trail_peak = high;
            trail_stop_price = trail_peak * (1.0 - trail_pct);
        }

        if active {
            if high > trail_peak {
                trail_peak = high;
                trail_stop_price = trail_peak * (1.0 - trail_pct);
            }
            if low <= trail_stop_price {
                return terminal(
                    entry_idx,
                    i,
                    p0,
                    Price::new(trail_stop_price),
                    ExitReason::TrailingStop,
                    peak_high,
                    mae_bps,
                );
            }
        }
    }

    end_of_data(candles, entry_idx, p0, peak_high, mae_bps)
}

fn terminal(
    entry_idx: usize,
    exit_idx: usize,
    p0: Price,
    exit_price: Price,
    reason: ExitReason,
    peak_high: Price,
    mae_bps: f64,
) -> PolicyRunResult {
    PolicyRunResult {
        entry_idx,
        exit_idx,
        entry_price: p0,
        exit_price,
        exit_reason: reason,
        peak_high,
        max_adverse_excursion_bps: Bps::new(mae_bps),
        gross_return_bps: Bps::new((exit_price.value() / p0.value() - 1.0) * 10_000.0),
        fees_already_applied: false,
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
    fn activates_then_trails_and_stops() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 1.30, 0.99, 1.25), // activates at +20%, peak 1.30
            c(120, 1.25, 1.30, 1.10, 1.15), // trail stop = 1.30*0.9=1.17, low 1.10 breaches
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0.20, 0.10, None);
        assert_eq!(r.exit_reason, ExitReason::TrailingStop);
        assert_eq!(r.exit_idx, 2);
    }

    #[test]
    fn hard_stop_preempts_trailing_logic() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 1.02, 0.80, 0.85),
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0.20, 0.10, Some(0.15));
        assert_eq!(r.exit_reason, ExitReason::HardStop);
    }
}
