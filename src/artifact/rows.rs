use serde::{Deserialize, Serialize};

use crate::domain::Interval;
use crate::metrics::PathMetrics;
use crate::policy::ExitReason;

/// One line of `alerts.ndjson`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRow {
    pub call_id: String,
    pub mint: String,
    pub caller_name: String,
    pub chain: String,
    pub alert_ts_ms: i64,
    pub created_at: String,
}

/// One line of `paths.ndjson`, emitted once per eligible call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRow {
    pub run_id: String,
    pub call_id: String,
    pub caller_name: String,
    pub mint: String,
    pub chain: String,
    pub interval: Interval,
    pub alert_ts_ms: i64,
    #[serde(flatten)]
    pub metrics: PathMetrics,
}

/// One line of `trades.ndjson`, emitted per (call, scenario).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    pub run_id: String,
    pub call_id: String,
    pub scenario_id: String,
    pub lag_ms: i64,
    pub interval: Interval,
    pub overlay_set_id: String,
    pub overlay_index: usize,
    pub ok: bool,
    pub net_return_pct: Option<f64>,
    pub gross_return_pct: Option<f64>,
    pub exit_reason: Option<ExitReason>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// One line of `per_caller.ndjson`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerCallerRow {
    pub caller_name: String,
    pub scenario_id: String,
    pub overlay_index: usize,
    pub call_count: usize,
    pub median_net_return_pct: f64,
    pub win_rate: f64,
}

/// One line of `errors.ndjson`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRow {
    pub scenario_id: Option<String>,
    pub call_id: Option<String>,
    pub error: String,
}
