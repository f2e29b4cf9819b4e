use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use callpath::artifact::{ArtifactWriter, DatasetInfo, GitInfo};
use callpath::store::{CandleStore, FixtureFile};
use callpath::{Cli, Command, RunConfig};
use clap::Parser;

#[tokio::main]
async fn main() {
    callpath::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { config, calls, candles, out, workers } => run_once(config, calls, candles, out, workers).await,
        Command::Sweep { config, calls, candles, out, workers } => run_sweep(config, calls, candles, out, workers).await,
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            let exit_code = err
                .downcast_ref::<callpath::EngineError>()
                .map(|e| e.exit_code())
                .unwrap_or(1);
            std::process::exit(exit_code);
        }
    }
}

async fn run_once(
    config_path: std::path::PathBuf,
    calls_path: std::path::PathBuf,
    candles_path: std::path::PathBuf,
    out: std::path::PathBuf,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = load_config(&config_path)?;
    if let Some(workers) = workers {
        config.workers = workers;
    }
    execute(&config, &calls_path, &candles_path, &out).await
}

async fn run_sweep(
    config_path: std::path::PathBuf,
    calls_path: std::path::PathBuf,
    candles_path: std::path::PathBuf,
    out: std::path::PathBuf,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = load_config(&config_path)?;
    if config.sweep.is_none() {
        anyhow::bail!("sweep requires `sweep` axes in the run config");
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
    execute(&config, &calls_path, &candles_path, &out).await
}

/// Loads a `RunConfig` from JSON or TOML, dispatching on the file
/// extension (§10.1); anything not recognized as `.toml` is parsed as JSON.
fn load_config(path: &Path) -> Result<RunConfig> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let is_toml = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    if is_toml {
        let text =
            std::str::from_utf8(&bytes).map_err(|e| callpath::EngineError::BadInput(format!("{}: {e}", path.display())))?;
        toml::from_str(text).map_err(|e| callpath::EngineError::BadInput(format!("{}: {e}", path.display())).into())
    } else {
        serde_json::from_slice(&bytes)
            .map_err(|e| callpath::EngineError::BadInput(format!("{}: {e}", path.display())).into())
    }
}

async fn execute(config: &RunConfig, calls_path: &Path, candles_path: &Path, out: &Path) -> Result<()> {
    let calls_bytes = std::fs::read(calls_path).with_context(|| format!("failed to read {}", calls_path.display()))?;
    let calls: Vec<callpath::Call> = serde_json::from_slice(&calls_bytes)
        .map_err(|e| callpath::EngineError::BadInput(format!("calls file: {e}")))?;

    let candles_bytes = std::fs::read(candles_path).with_context(|| format!("failed to read {}", candles_path.display()))?;
    let fixture: FixtureFile = serde_json::from_slice(&candles_bytes)
        .map_err(|e| callpath::EngineError::BadInput(format!("candles fixture: {e}")))?;
    let store: Arc<dyn CandleStore> = Arc::new(fixture.into_store());

    if calls.is_empty() {
        return Err(callpath::EngineError::BadInput("no calls provided".to_string()).into());
    }

    let run_id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, calls_path.display().to_string().as_bytes()).to_string();
    let config_hash = callpath::fingerprint::hash_json(config)?;
    let manifest_path = out.join("manifest.json");
    let writer = if manifest_path.exists() {
        tracing::info!(path = %out.display(), "resuming existing run");
        ArtifactWriter::resume(out, &config_hash).await?
    } else {
        let from_ms = calls.iter().map(|c| c.alert_ts_ms).min().unwrap_or(0);
        let to_ms = calls.iter().map(|c| c.alert_ts_ms).max().unwrap_or(0);
        let dataset = DatasetInfo {
            from_iso: chrono::DateTime::from_timestamp_millis(from_ms).map(|t| t.to_rfc3339()).unwrap_or_default(),
            to_iso: chrono::DateTime::from_timestamp_millis(to_ms).map(|t| t.to_rfc3339()).unwrap_or_default(),
            interval: config.strategy.interval,
            calls_count: calls.len(),
        };
        let git = GitInfo { commit: "unknown".to_string(), branch: "unknown".to_string(), dirty: false };
        ArtifactWriter::create(out, run_id, git, dataset, config_hash).await?
    };
    let writer = Arc::new(writer);

    let outcome = callpath::runner::run(store, calls, config, writer.clone()).await;

    match outcome {
        Ok(outcome) => {
            writer.finalize_ok(outcome.timing).await?;
            Ok(())
        }
        Err(err) => {
            let timing = callpath::artifact::Timing::default();
            writer.finalize_failed(timing, err.to_string()).await?;
            Err(err.into())
        }
    }
}
