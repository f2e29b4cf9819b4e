use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Ok,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitInfo {
    pub commit: String,
    pub branch: String,
    pub dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub from_iso: String,
    pub to_iso: String,
    pub interval: Interval,
    pub calls_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timing {
    pub plan_ms: u64,
    pub coverage_ms: u64,
    pub slice_ms: u64,
    pub load_ms: u64,
    pub compute_ms: u64,
    pub store_ms: u64,
    pub total_ms: u64,
}

/// The run manifest (§4.C9, §6): written provisionally before any work
/// happens and rewritten at finalisation. `completed_scenario_ids` is what
/// resume reads back to skip already-finished scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub status: RunStatus,
    pub git: GitInfo,
    pub dataset: DatasetInfo,
    pub timing: Timing,
    pub completed_scenario_ids: BTreeSet<String>,
    pub failure_reason: Option<String>,
    /// Content hash of the run config (§10.7), so `resume` can tell a
    /// continuation of this run apart from a stale directory left behind by
    /// a run against a different config.
    pub config_hash: String,
}

impl RunManifest {
    pub fn pending(run_id: impl Into<String>, git: GitInfo, dataset: DatasetInfo, config_hash: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Pending,
            git,
            dataset,
            timing: Timing::default(),
            completed_scenario_ids: BTreeSet::new(),
            failure_reason: None,
            config_hash: config_hash.into(),
        }
    }
}
