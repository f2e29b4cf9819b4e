use crate::config::types::{Bps, Price};
use crate::domain::Candle;
use crate::policy::fixed_stop::end_of_data;
use crate::policy::types::{ExitReason, PolicyRunResult};

/// Hard deadline plus an optional take-profit (§4.C4.2). Bar priority: the
/// deadline fires before the take-profit.
pub fn run(
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    alert_ms: i64,
    max_hold_ms: i64,
    take_profit_pct: Option<f64>,
) -> PolicyRunResult {
    let p0v = p0.value();
    let deadline_ms = alert_ms + max_hold_ms;
    let tp_price = take_profit_pct.map_or(f64::INFINITY, |tp| p0v * (1.0 + tp));

    let mut peak_high = candles[entry_idx].high;
    let mut mae_bps = 0.0_f64;

    for i in entry_idx..candles.len() {
        let bar = &candles[i];
        if bar.high.value() > peak_high.value() {
            peak_high = bar.high;
        }
        mae_bps = mae_bps.min((bar.low.value() / p0v - 1.0) * 10_000.0);

        if bar.timestamp_ms() >= deadline_ms {
            let exit_price = bar.close;
            return PolicyRunResult {
                entry_idx,
                exit_idx: i,
                entry_price: p0,
                exit_price,
                exit_reason: ExitReason::TimeStop,
                peak_high,
                max_adverse_excursion_bps: Bps::new(mae_bps),
                gross_return_bps: Bps::new((exit_price.value() / p0v - 1.0) * 10_000.0),
                fees_already_applied: false,
                ladder_fraction_total: None,
            };
        }
        if bar.high.value() >= tp_price {
            let exit_price = Price::new(tp_price);
            return PolicyRunResult {
                entry_idx,
                exit_idx: i,
                entry_price: p0,
                exit_price,
                exit_reason: ExitReason::TakeProfit,
                peak_high,
                max_adverse_excursion_bps: Bps::new(mae_bps),
                gross_return_bps: Bps::new((tp_price / p0v - 1.0) * 10_000.0),
                fees_already_applied: false,
                ladder_fraction_total: None,
            };
        }
    }

    end_of_data(candles, entry_idx, p0, peak_high, mae_bps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(ts: i64, o: f64, h: f64, l: f64, cl: f64) -> Candle {
        Candle::new(ts, o, h, l, cl, 0.0)
    }

    #[test]
    fn exits_at_deadline() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 1.05, 0.98, 1.02),
            c(120, 1.02, 1.05, 1.0, 1.03),
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0, 50_000, None);
        assert_eq!(r.exit_reason, ExitReason::TimeStop);
        assert_eq!(r.exit_idx, 1);
    }
}
