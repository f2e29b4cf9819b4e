//! The "truth layer": alert-anchored path statistics computed independently
//! of any exit-risk policy.

pub mod path;

pub use path::{compute_path_metrics, PathMetrics, PathMetricsOptions};
