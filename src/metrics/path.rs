use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Alert-anchored path statistics (§4.C3). `p0` is `NaN` and every other
/// field is `None`/`false` when no anchor candle exists or its close is
/// non-finite or non-positive — the computer never searches forward for a
/// "better" anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathMetrics {
    pub t0_ms: i64,
    pub p0: f64,
    pub hit_2x: bool,
    pub t2x_ms: Option<i64>,
    pub hit_3x: bool,
    pub t3x_ms: Option<i64>,
    pub hit_4x: bool,
    pub t4x_ms: Option<i64>,
    pub dd_bps: Option<f64>,
    pub dd_to_2x_bps: Option<f64>,
    pub alert_to_activity_ms: Option<i64>,
    pub peak_multiple: Option<f64>,
}

impl PathMetrics {
    fn empty(alert_ms: i64) -> Self {
        Self {
            t0_ms: alert_ms,
            p0: f64::NAN,
            hit_2x: false,
            t2x_ms: None,
            hit_3x: false,
            t3x_ms: None,
            hit_4x: false,
            t4x_ms: None,
            dd_bps: None,
            dd_to_2x_bps: None,
            alert_to_activity_ms: None,
            peak_multiple: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PathMetricsOptions {
    pub activity_move_pct: f64,
    pub dd_to_2x_inclusive: bool,
}

impl Default for PathMetricsOptions {
    fn default() -> Self {
        Self {
            activity_move_pct: 0.10,
            dd_to_2x_inclusive: true,
        }
    }
}

/// Pure, single forward pass over `candles` from the anchor onward
/// (§4.C3). Deterministic: identical inputs produce byte-identical output.
pub fn compute_path_metrics(
    candles: &[Candle],
    alert_ms: i64,
    opts: &PathMetricsOptions,
) -> PathMetrics {
    let Some(anchor_idx) = candles.iter().position(|c| c.timestamp_ms() >= alert_ms) else {
        return PathMetrics::empty(alert_ms);
    };

    let p0 = candles[anchor_idx].close.value();
    if !p0.is_finite() || p0 <= 0.0 {
        return PathMetrics::empty(alert_ms);
    }

    let mut peak_high = candles[anchor_idx].high.value();
    let mut min_low = candles[anchor_idx].low.value();
    let mut pre2x_low = candles[anchor_idx].low.value();

    let mut hit = [false; 3];
    let mut t_hit: [Option<i64>; 3] = [None; 3];
    let mut alert_to_activity_ms = None;

    for j in anchor_idx..candles.len() {
        let bar = &candles[j];
        let high = bar.high.value();
        let low = bar.low.value();

        peak_high = peak_high.max(high);
        min_low = min_low.min(low);

        if alert_to_activity_ms.is_none() {
            let move_frac = (high / p0 - 1.0).abs().max((1.0 - low / p0).abs());
            if move_frac >= opts.activity_move_pct {
                alert_to_activity_ms = Some(bar.timestamp_ms() - alert_ms);
            }
        }

        let hit_2x_before_this_bar = hit[0];

        for (k, mult) in [2.0_f64, 3.0, 4.0].into_iter().enumerate() {
            if !hit[k] && high / p0 >= mult {
                hit[k] = true;
                t_hit[k] = Some(bar.timestamp_ms());
            }
        }

        if !hit_2x_before_this_bar && (opts.dd_to_2x_inclusive || !hit[0]) {
            pre2x_low = pre2x_low.min(low);
        }
    }

    let dd_bps = Some((min_low / p0 - 1.0) * 10_000.0);
    let dd_to_2x_bps = hit[0].then(|| (pre2x_low / p0 - 1.0) * 10_000.0);
    let peak_multiple = Some(peak_high / p0);

    PathMetrics {
        t0_ms: alert_ms,
        p0,
        hit_2x: hit[0],
        t2x_ms: t_hit[0],
        hit_3x: hit[1],
        t3x_ms: t_hit[1],
        hit_4x: hit[2],
        t4x_ms: t_hit[2],
        dd_bps,
        dd_to_2x_bps,
        alert_to_activity_ms,
        peak_multiple,
    }
}
