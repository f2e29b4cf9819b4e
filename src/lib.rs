#![allow(clippy::too_many_arguments)]

//! Deterministic replay engine: given timestamped calls and an OHLCV
//! candle store, computes alert-anchored path metrics and drives
//! exit-risk policies to a realised outcome, persisting content-addressed
//! run artifacts.

pub mod artifact;
pub mod config;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod planner;
pub mod policy;
pub mod runner;
pub mod store;
pub mod sweep;

pub use config::RunConfig;
pub use domain::{Call, Candle, Interval};
pub use error::{EngineError, EngineResult};
pub use metrics::{compute_path_metrics, PathMetrics};
pub use policy::{execute_policy, ExecutionResult};

use clap::{Parser, Subcommand};

/// Command-line surface (§10.2): `run` executes a single strategy against
/// a dataset; `sweep` enumerates the scenario matrix from the config's
/// `sweep` axes.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the configured strategy against a calls file, writing a run
    /// directory of artifacts.
    Run {
        /// Path to a JSON or TOML `RunConfig` (format inferred from the
        /// extension).
        #[arg(long)]
        config: std::path::PathBuf,
        /// Path to a JSON array of `Call`s.
        #[arg(long)]
        calls: std::path::PathBuf,
        /// Path to a JSON candle fixture, as produced by `make_fixture`.
        #[arg(long)]
        candles: std::path::PathBuf,
        /// Run directory to create (or resume, if it already holds a
        /// manifest).
        #[arg(long)]
        out: std::path::PathBuf,
        /// Overrides `config.workers`.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Same as `run`, but requires `config.sweep` to be set and writes the
    /// aggregated scenario matrix alongside the per-scenario trade rows.
    Sweep {
        #[arg(long)]
        config: std::path::PathBuf,
        #[arg(long)]
        calls: std::path::PathBuf,
        #[arg(long)]
        candles: std::path::PathBuf,
        #[arg(long)]
        out: std::path::PathBuf,
        /// Overrides `config.workers`.
        #[arg(long)]
        workers: Option<usize>,
    },
}

/// Installs the tracing subscriber (§10.3). `RUST_LOG` controls verbosity;
/// defaults to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
