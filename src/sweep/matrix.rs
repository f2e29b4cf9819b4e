use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, OrderStatistics};

use crate::artifact::{PerCallerRow, TradeRow};
use crate::domain::Interval;

/// Aggregate outcome for one overlay within a scenario, the unit
/// [`MatrixEntry::best_overlay_index`] ranks over (§4.C10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayStats {
    pub overlay_index: usize,
    pub call_count: usize,
    pub median_net_return_pct: f64,
    pub p25_net_return_pct: f64,
    pub p75_net_return_pct: f64,
    pub win_rate: f64,
}

/// One record per `(lagMs, interval, overlaySetId)` scenario: every
/// overlay's aggregate stats plus which one won (spec §6 `matrix.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub scenario_id: String,
    pub lag_ms: i64,
    pub interval: Interval,
    pub overlay_set_id: String,
    pub overlays: Vec<OverlayStats>,
    pub best_overlay_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix {
    pub entries: Vec<MatrixEntry>,
}

#[derive(Default)]
struct Bucket {
    returns: Vec<f64>,
    wins: usize,
}

fn overlay_stats(overlay_index: usize, call_count: usize, bucket: Bucket) -> OverlayStats {
    let (median, p25, p75, win_rate) = if bucket.returns.is_empty() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        let mut data = Data::new(bucket.returns.clone());
        let median = data.median();
        let p25 = data.percentile(25);
        let p75 = data.percentile(75);
        (median, p25, p75, bucket.wins as f64 / bucket.returns.len() as f64)
    };
    OverlayStats {
        overlay_index,
        call_count,
        median_net_return_pct: median,
        p25_net_return_pct: p25,
        p75_net_return_pct: p75,
        win_rate,
    }
}

/// Groups `rows` by scenario, then by overlay within each scenario,
/// computing per-overlay median/quartiles/win-rate and the best-performing
/// overlay per scenario (spec §6 `matrix.json`: one record per
/// `(lagMs, interval, overlaySetId)`, aggregate stats plus `bestOverlay`).
/// Rows with `ok: false` are counted toward `call_count` but excluded from
/// the return statistics.
pub fn build_matrix(rows: &[TradeRow]) -> Matrix {
    let mut scenario_meta: BTreeMap<String, (i64, Interval, String)> = BTreeMap::new();
    let mut buckets: BTreeMap<(String, usize), Bucket> = BTreeMap::new();
    let mut counts: BTreeMap<(String, usize), usize> = BTreeMap::new();

    for row in rows {
        scenario_meta
            .entry(row.scenario_id.clone())
            .or_insert_with(|| (row.lag_ms, row.interval, row.overlay_set_id.clone()));

        let key = (row.scenario_id.clone(), row.overlay_index);
        *counts.entry(key.clone()).or_insert(0) += 1;
        if let (true, Some(net)) = (row.ok, row.net_return_pct) {
            let bucket = buckets.entry(key).or_default();
            bucket.returns.push(net);
            if net > 0.0 {
                bucket.wins += 1;
            }
        }
    }

    let mut entries = Vec::with_capacity(scenario_meta.len());
    for (scenario_id, (lag_ms, interval, overlay_set_id)) in scenario_meta {
        let mut overlays: Vec<OverlayStats> = counts
            .iter()
            .filter(|((sid, _), _)| *sid == scenario_id)
            .map(|(key, &call_count)| {
                let bucket = buckets.remove(key).unwrap_or_default();
                overlay_stats(key.1, call_count, bucket)
            })
            .collect();
        overlays.sort_by_key(|o| o.overlay_index);

        let best_overlay_index = overlays
            .iter()
            .max_by(|a, b| a.median_net_return_pct.total_cmp(&b.median_net_return_pct))
            .map(|o| o.overlay_index);

        entries.push(MatrixEntry {
            scenario_id,
            lag_ms,
            interval,
            overlay_set_id,
            overlays,
            best_overlay_index,
        });
    }

    Matrix { entries }
}

/// Per-caller leaderboard rows (one per `(caller, scenario, overlay)`),
/// the same per-overlay aggregation as [`build_matrix`] but keyed
/// additionally by caller name.
pub fn build_per_caller_rows(rows: &[TradeRow], caller_by_call_id: &BTreeMap<String, String>) -> Vec<PerCallerRow> {
    let mut buckets: BTreeMap<(String, String, usize), Bucket> = BTreeMap::new();
    let mut counts: BTreeMap<(String, String, usize), usize> = BTreeMap::new();

    for row in rows {
        let Some(caller) = caller_by_call_id.get(&row.call_id) else {
            continue;
        };
        let key = (caller.clone(), row.scenario_id.clone(), row.overlay_index);
        *counts.entry(key.clone()).or_insert(0) += 1;
        if let (true, Some(net)) = (row.ok, row.net_return_pct) {
            let bucket = buckets.entry(key).or_default();
            bucket.returns.push(net);
            if net > 0.0 {
                bucket.wins += 1;
            }
        }
    }

    let mut out = Vec::with_capacity(counts.len());
    for (key, call_count) in counts {
        let bucket = buckets.remove(&key).unwrap_or_default();
        let (median, win_rate) = if bucket.returns.is_empty() {
            (0.0, 0.0)
        } else {
            let mut data = Data::new(bucket.returns.clone());
            (data.median(), bucket.wins as f64 / bucket.returns.len() as f64)
        };
        out.push(PerCallerRow {
            caller_name: key.0,
            scenario_id: key.1,
            overlay_index: key.2,
            call_count,
            median_net_return_pct: median,
            win_rate,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(scenario_id: &str, overlay_index: usize, net: Option<f64>, ok: bool) -> TradeRow {
        TradeRow {
            run_id: "run-1".into(),
            call_id: "call-1".into(),
            scenario_id: scenario_id.into(),
            lag_ms: 0,
            interval: crate::domain::Interval::M1,
            overlay_set_id: "default".into(),
            overlay_index,
            ok,
            net_return_pct: net,
            gross_return_pct: net,
            exit_reason: None,
            error_code: None,
            error_message: None,
        }
    }

    #[test]
    fn picks_best_overlay_within_each_scenario() {
        let rows = vec![
            row("a", 0, Some(1.0), true),
            row("a", 1, Some(5.0), true),
            row("b", 0, Some(10.0), true),
        ];
        let matrix = build_matrix(&rows);
        assert_eq!(matrix.entries.len(), 2);

        let a = matrix.entries.iter().find(|e| e.scenario_id == "a").unwrap();
        assert_eq!(a.best_overlay_index, Some(1));
        assert_eq!(a.overlays.len(), 2);

        let b = matrix.entries.iter().find(|e| e.scenario_id == "b").unwrap();
        assert_eq!(b.best_overlay_index, Some(0));
    }

    #[test]
    fn failed_rows_count_but_do_not_skew_returns() {
        let rows = vec![row("a", 0, Some(5.0), true), row("a", 0, None, false)];
        let matrix = build_matrix(&rows);
        let overlay = &matrix.entries[0].overlays[0];
        assert_eq!(overlay.call_count, 2);
        assert_eq!(overlay.median_net_return_pct, 5.0);
    }
}
