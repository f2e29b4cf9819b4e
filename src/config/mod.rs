//! Run configuration: the typed numeric wrappers, the fee model, and the
//! strategy/sweep specs that together make up a `RunConfig`.

pub mod fee;
pub mod strategy;
pub mod types;

pub use fee::FeeConfig;
pub use strategy::{PolicySet, StrategySpec, SweepAxes};

use serde::{Deserialize, Serialize};

/// Top-level configuration for a single invocation: the strategy spec, the
/// fee model, and (for `sweep`) the axes to enumerate. Loaded from JSON or
/// TOML and overridable from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub strategy: StrategySpec,
    #[serde(default)]
    pub fee: FeeConfig,
    pub sweep: Option<SweepAxes>,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    8
}
