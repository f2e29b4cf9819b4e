use crate::config::types::{Bps, Price};
use crate::domain::Candle;
use crate::policy::types::{ExitReason, PolicyRunResult};

/// Fixed stop-loss, optional take-profit (§4.C4.1). Bar priority: stop
/// before take-profit.
pub fn run(
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    stop_pct: f64,
    take_profit_pct: Option<f64>,
) -> PolicyRunResult {
    let p0v = p0.value();
    let stop_price = p0v * (1.0 - stop_pct);
    let tp_price = take_profit_pct.map_or(f64::INFINITY, |tp| p0v * (1.0 + tp));

    let mut peak_high = candles[entry_idx].high;
    let mut mae_bps = 0.0_f64;

    for i in entry_idx..candles.len() {
        let bar = &candles[i];
        if bar.high.value() > peak_high.value() {
            peak_high = bar.high;
        }
        mae_bps = mae_bps.min((bar.low.value() / p0v - 1.0) * 10_000.0);

        if bar.low.value() <= stop_price {
            return exit_at(
                entry_idx,
                i,
                p0,
                Price::new(stop_price),
                ExitReason::StopLoss,
                peak_high,
                mae_bps,
            );
        }
        if bar.high.value() >= tp_price {
            return exit_at(
                entry_idx,
                i,
                p0,
                Price::new(tp_price),
                ExitReason::TakeProfit,
                peak_high,
                mae_bps,
            );
        }
    }

    end_of_data(candles, entry_idx, p0, peak_high, mae_bps)
}

fn exit_at(
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

/// Shared by every single-trade policy: if no trigger fires by the end of
/// the window, close at the last candle's close.
pub(crate) fn end_of_data(
    candles: &[Candle],
    entry_idx: usize,
    p0: Price,
    peak_high: Price,
    mae_bps: f64,
) -> PolicyRunResult {
    let last_idx = candles.len() - 1;
    let exit_price = candles[last_idx].close;
    exit_at(
        entry_idx,
        last_idx,
        p0,
        exit_price,
        ExitReason::EndOfData,
        peak_high,
        mae_bps,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(ts: i64, o: f64, h: f64, l: f64, cl: f64) -> Candle {
        Candle::new(ts, o, h, l, cl, 0.0)
    }

    #[test]
    fn stops_out_on_first_breach() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 1.05, 0.80, 0.95), // low breaches 20% stop
            c(120, 0.95, 1.0, 0.9, 0.95),
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0.20, None);
        assert_eq!(r.exit_reason, ExitReason::StopLoss);
        assert_eq!(r.exit_idx, 1);
    }

    #[test]
    fn take_profit_wins_when_stop_not_breached() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0),
            c(60, 1.0, 1.25, 0.95, 1.2),
        ];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0.20, Some(0.20));
        assert_eq!(r.exit_reason, ExitReason::TakeProfit);
    }

    #[test]
    fn falls_through_to_end_of_data() {
        let candles = vec![c(0, 1.0, 1.0, 1.0, 1.0), c(60, 1.0, 1.05, 0.98, 1.02)];
        let p0 = candles[0].close;
        let r = run(&candles, 0, p0, 0.50, None);
        assert_eq!(r.exit_reason, ExitReason::EndOfData);
        assert_eq!(r.exit_idx, 1);
    }
}
