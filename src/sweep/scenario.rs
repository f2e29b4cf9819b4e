use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::config::{PolicySet, RunConfig, StrategySpec, SweepAxes};
use crate::domain::Interval;
use crate::policy::Policy;

/// One point in the sweep matrix: a concrete `(interval, entry lag, policy
/// set)` triple (§4.C10). `policies` are the overlays run independently
/// against every eligible call under this scenario; each produces its own
/// trade row distinguished by `overlay_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub interval: Interval,
    pub entry_lag_ms: i64,
    pub overlay_set_id: String,
    pub policies: Vec<Policy>,
}

fn scenario_id(interval: Interval, entry_lag_ms: i64, overlay_set_id: &str) -> String {
    format!("lag={entry_lag_ms}_interval={interval}_overlaySet={overlay_set_id}")
}

/// Enumerates the Cartesian product of a sweep's axes (§4.C10). Order is
/// deterministic: intervals outermost, then lags, then policy sets, all in
/// the order they appear in the config.
pub fn enumerate_scenarios(axes: &SweepAxes) -> Vec<Scenario> {
    iproduct!(&axes.intervals, &axes.entry_lags_ms, &axes.policy_sets)
        .map(|(interval, lag, set): (&Interval, &i64, &PolicySet)| Scenario {
            id: scenario_id(*interval, *lag, &set.id),
            interval: *interval,
            entry_lag_ms: *lag,
            overlay_set_id: set.id.clone(),
            policies: set.policies.clone(),
        })
        .collect()
}

/// The single implicit scenario for a non-sweep run: the strategy's own
/// interval and policies, zero entry lag.
pub fn default_scenario(strategy: &StrategySpec) -> Scenario {
    Scenario {
        id: scenario_id(strategy.interval, 0, "default"),
        interval: strategy.interval,
        entry_lag_ms: 0,
        overlay_set_id: "default".to_string(),
        policies: strategy.policies.clone(),
    }
}

/// All scenarios a run must execute: the sweep matrix if configured,
/// otherwise the single default scenario.
pub fn scenarios_for(config: &RunConfig) -> Vec<Scenario> {
    match &config.sweep {
        Some(axes) => enumerate_scenarios(axes),
        None => vec![default_scenario(&config.strategy)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Pct;

    fn policy_set(id: &str) -> PolicySet {
        PolicySet {
            id: id.to_string(),
            policies: vec![Policy::FixedStop { stop_pct: Pct::new(0.1), take_profit_pct: None }],
        }
    }

    #[test]
    fn enumerates_full_cartesian_product() {
        let axes = SweepAxes {
            intervals: vec![Interval::M1, Interval::M5],
            entry_lags_ms: vec![0, 1_000],
            policy_sets: vec![policy_set("a"), policy_set("b")],
        };
        let scenarios = enumerate_scenarios(&axes);
        assert_eq!(scenarios.len(), 2 * 2 * 2);
        assert!(scenarios.iter().any(|s| s.id == "lag=1000_interval=5m_overlaySet=b"));
    }

    #[test]
    fn no_sweep_axes_yields_one_default_scenario() {
        let strategy = StrategySpec {
            interval: Interval::M1,
            indicator_warmup_bars: 0,
            entry_delay_bars: 0,
            max_hold_ms: 60_000,
            policies: vec![Policy::FixedStop { stop_pct: Pct::new(0.1), take_profit_pct: None }],
        };
        let config = RunConfig { strategy, fee: Default::default(), sweep: None, workers: 4 };
        let scenarios = scenarios_for(&config);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].overlay_set_id, "default");
    }
}
