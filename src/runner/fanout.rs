use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::artifact::{AlertRow, ArtifactWriter, ErrorRow, PathRow, Timing, TradeRow};
use crate::config::{RunConfig, StrategySpec};
use crate::domain::{Call, Interval};
use crate::error::EngineError;
use crate::metrics::{compute_path_metrics, PathMetricsOptions};
use crate::planner::{gate_coverage, plan_windows};
use crate::policy::execute_policy;
use crate::store::candle_store::CandleStore;
use crate::store::slice::{materialize_slice, CallWindow, Slice};
use crate::sweep::{build_matrix, build_per_caller_rows, scenarios_for, Scenario};

/// Summary handed back to the CLI once a run completes.
pub struct RunOutcome {
    pub timing: Timing,
    pub eligible_calls: usize,
    pub excluded_calls: usize,
}

fn strategy_at_interval(strategy: &StrategySpec, interval: Interval) -> StrategySpec {
    StrategySpec {
        interval,
        indicator_warmup_bars: strategy.indicator_warmup_bars,
        entry_delay_bars: strategy.entry_delay_bars,
        max_hold_ms: strategy.max_hold_ms,
        policies: Vec::new(),
    }
}

/// Drives a full run to completion: plans windows, gates coverage,
/// materialises slices, then fans out per call with bounded concurrency
/// (§4.C8), writing every row through `writer`. Scenarios already present
/// in `writer`'s manifest (resume) are skipped.
pub async fn run(
    store: Arc<dyn CandleStore>,
    calls: Vec<Call>,
    config: &RunConfig,
    writer: Arc<ArtifactWriter>,
) -> Result<RunOutcome, EngineError> {
    let already_done = writer.completed_scenario_ids().await;
    let scenarios: Vec<Scenario> = scenarios_for(config)
        .into_iter()
        .filter(|s| !already_done.contains(&s.id))
        .collect();

    let mut intervals: Vec<Interval> = vec![config.strategy.interval];
    for s in &scenarios {
        if !intervals.contains(&s.interval) {
            intervals.push(s.interval);
        }
    }

    let plan_start = Instant::now();
    let mut windows_by_interval: HashMap<Interval, Vec<CallWindow>> = HashMap::new();
    for iv in &intervals {
        let spec = strategy_at_interval(&config.strategy, *iv);
        windows_by_interval.insert(*iv, plan_windows(&calls, &spec));
    }
    let plan_ms = plan_start.elapsed().as_millis() as u64;

    let coverage_start = Instant::now();
    let mut eligible_call_ids_by_interval: HashMap<Interval, HashSet<String>> = HashMap::new();
    let mut excluded_calls: HashSet<String> = HashSet::new();
    for iv in &intervals {
        let windows = &windows_by_interval[iv];
        let result = gate_coverage(&*store, windows).await;
        for excluded in &result.excluded {
            excluded_calls.insert(excluded.call_id.clone());
            writer
                .append_error(&ErrorRow {
                    scenario_id: None,
                    call_id: Some(excluded.call_id.clone()),
                    error: format!("excluded at interval {iv}: {:?}", excluded.reason),
                })
                .await?;
        }
        eligible_call_ids_by_interval.insert(*iv, result.eligible.into_iter().map(|w| w.call_id).collect());
    }
    let coverage_ms = coverage_start.elapsed().as_millis() as u64;

    if !calls.is_empty() && excluded_calls.len() == calls.len() {
        let base_windows = &windows_by_interval[&config.strategy.interval];
        let from_ms = base_windows.iter().map(|w| w.from_ms).min().unwrap_or(0);
        let to_ms = base_windows.iter().map(|w| w.to_ms).max().unwrap_or(0);
        return Err(EngineError::NoCoverage {
            call_id: format!("all {} calls", calls.len()),
            from_ms,
            to_ms,
        });
    }

    let slice_start = Instant::now();
    let mut slices: HashMap<Interval, Slice> = HashMap::new();
    for iv in &intervals {
        let eligible_ids = &eligible_call_ids_by_interval[iv];
        let windows: Vec<CallWindow> = windows_by_interval[iv]
            .iter()
            .filter(|w| eligible_ids.contains(&w.call_id))
            .cloned()
            .collect();
        if windows.is_empty() {
            continue;
        }
        let slice = materialize_slice(&*store, &windows).await?;
        slices.insert(*iv, slice);
    }
    let slice_ms = slice_start.elapsed().as_millis() as u64;
    let slices = Arc::new(slices);

    let compute_start = Instant::now();
    let base_iv = config.strategy.interval;
    let caller_by_call_id: BTreeMap<String, String> =
        calls.iter().map(|c| (c.id.clone(), c.caller.clone())).collect();

    for call in &calls {
        writer
            .append_alert(&AlertRow {
                call_id: call.id.clone(),
                mint: call.mint.clone(),
                caller_name: call.caller.clone(),
                chain: call.chain.clone(),
                alert_ts_ms: call.alert_ts_ms,
                created_at: String::new(),
            })
            .await?;

        if let Some(candles) = slices.get(&base_iv).and_then(|s| s.candles_for(&call.id)) {
            let metrics = compute_path_metrics(candles, call.alert_ts_ms, &PathMetricsOptions::default());
            writer
                .append_path(&PathRow {
                    run_id: writer.run_id().to_string(),
                    call_id: call.id.clone(),
                    caller_name: call.caller.clone(),
                    mint: call.mint.clone(),
                    chain: call.chain.clone(),
                    interval: base_iv,
                    alert_ts_ms: call.alert_ts_ms,
                    metrics,
                })
                .await?;
        }
    }

    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
    let trade_rows: Arc<Mutex<Vec<TradeRow>>> = Arc::new(Mutex::new(Vec::new()));
    let run_id = writer.run_id().to_string();
    let fee = config.fee.clone();
    let scenarios = Arc::new(scenarios);

    let mut handles = Vec::with_capacity(calls.len());
    for call in calls.iter().filter(|c| !excluded_calls.contains(&c.id)).cloned() {
        let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
        let slices = slices.clone();
        let scenarios = scenarios.clone();
        let writer = writer.clone();
        let trade_rows = trade_rows.clone();
        let fee = fee.clone();
        let run_id = run_id.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit;
            for scenario in scenarios.iter() {
                let Some(candles) = slices.get(&scenario.interval).and_then(|s| s.candles_for(&call.id)) else {
                    continue;
                };
                let alert_ms = call.alert_ts_ms + scenario.entry_lag_ms;

                for (overlay_index, policy) in scenario.policies.iter().enumerate() {
                    let row = match execute_policy(candles, alert_ms, policy, &fee) {
                        Ok(result) => TradeRow {
                            run_id: run_id.clone(),
                            call_id: call.id.clone(),
                            scenario_id: scenario.id.clone(),
                            lag_ms: scenario.entry_lag_ms,
                            interval: scenario.interval,
                            overlay_set_id: scenario.overlay_set_id.clone(),
                            overlay_index,
                            ok: true,
                            net_return_pct: Some(result.realized_return_bps.value() / 100.0),
                            gross_return_pct: Some(result.gross_return_bps.value() / 100.0),
                            exit_reason: Some(result.exit_reason),
                            error_code: None,
                            error_message: None,
                        },
                        Err(EngineError::InvariantViolation(msg)) => {
                            return Err(EngineError::InvariantViolation(msg));
                        }
                        Err(err) => {
                            warn!(call_id = %call.id, scenario = %scenario.id, error = %err, "scenario failed");
                            let _ = writer
                                .append_error(&ErrorRow {
                                    scenario_id: Some(scenario.id.clone()),
                                    call_id: Some(call.id.clone()),
                                    error: err.to_string(),
                                })
                                .await;
                            TradeRow {
                                run_id: run_id.clone(),
                                call_id: call.id.clone(),
                                scenario_id: scenario.id.clone(),
                                lag_ms: scenario.entry_lag_ms,
                                interval: scenario.interval,
                                overlay_set_id: scenario.overlay_set_id.clone(),
                                overlay_index,
                                ok: false,
                                net_return_pct: None,
                                gross_return_pct: None,
                                exit_reason: None,
                                error_code: Some("scenario_failure".to_string()),
                                error_message: Some(err.to_string()),
                            }
                        }
                    };
                    writer.append_trade(&row).await?;
                    trade_rows.lock().await.push(row);
                }
            }
            Ok(())
        }));
    }

    for handle in handles {
        handle.await.map_err(|e| EngineError::StorageFault(anyhow::anyhow!(e)))??;
    }

    for scenario in scenarios.iter() {
        writer
            .mark_scenario_completed(scenario.id.clone())
            .await
            .map_err(EngineError::StorageFault)?;
    }

    let rows = trade_rows.lock().await;
    let matrix = build_matrix(&rows);
    writer.write_matrix(&matrix).await?;
    for row in build_per_caller_rows(&rows, &caller_by_call_id) {
        writer.append_per_caller(&row).await?;
    }
    drop(rows);

    let compute_ms = compute_start.elapsed().as_millis() as u64;
    let total_ms = plan_ms + coverage_ms + slice_ms + compute_ms;

    let eligible_calls = calls.len().saturating_sub(excluded_calls.len());
    info!(
        plan_ms,
        coverage_ms,
        slice_ms,
        compute_ms,
        total_ms,
        eligible_calls,
        excluded_calls = excluded_calls.len(),
        "run complete"
    );

    Ok(RunOutcome {
        timing: Timing {
            plan_ms,
            coverage_ms,
            slice_ms,
            load_ms: 0,
            compute_ms,
            store_ms: 0,
            total_ms,
        },
        eligible_calls,
        excluded_calls: excluded_calls.len(),
    })
}
