use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::artifact::manifest::{DatasetInfo, GitInfo, RunManifest, RunStatus, Timing};
use crate::artifact::rows::{AlertRow, ErrorRow, PathRow, PerCallerRow, TradeRow};
use crate::error::EngineError;

/// Owns the run directory. Safe to share behind an `Arc` across concurrent
/// per-call workers: the manifest is guarded by an internal mutex and every
/// ndjson append opens in append mode, so rows interleave but never
/// corrupt each other.
pub struct ArtifactWriter {
    root: PathBuf,
    run_id: String,
    manifest: Mutex<RunManifest>,
}

impl ArtifactWriter {
    /// Creates the run directory and writes a provisional `manifest.json`
    /// with `status: pending` before any other work happens (§4.C9).
    /// `config_hash` is the content hash of the run config (§10.7),
    /// recorded so a later `resume` can detect a stale directory.
    pub async fn create(
        root: impl AsRef<Path>,
        run_id: impl Into<String>,
        git: GitInfo,
        dataset: DatasetInfo,
        config_hash: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let run_id = run_id.into();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create run directory {}", root.display()))?;

        let manifest = RunManifest::pending(run_id.clone(), git, dataset, config_hash);
        let writer = Self { root, run_id, manifest: Mutex::new(manifest) };
        writer.write_manifest().await?;
        Ok(writer)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Resumes an existing run: reads back the manifest's completed
    /// scenario IDs so the caller can skip them. Rejects the resume if
    /// `config_hash` doesn't match the one the directory was created with,
    /// since replaying a different config against stale completed-scenario
    /// bookkeeping would silently skip work that was never actually run.
    pub async fn resume(root: impl AsRef<Path>, config_hash: &str) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join("manifest.json");
        let bytes = fs::read(&manifest_path)
            .await
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest: RunManifest = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?;
        if manifest.config_hash != config_hash {
            anyhow::bail!(
                "refusing to resume {}: config hash {} does not match the run's original {}",
                root.display(),
                config_hash,
                manifest.config_hash
            );
        }
        let run_id = manifest.run_id.clone();
        Ok(Self { root, run_id, manifest: Mutex::new(manifest) })
    }

    pub async fn completed_scenario_ids(&self) -> std::collections::BTreeSet<String> {
        self.manifest.lock().await.completed_scenario_ids.clone()
    }

    pub async fn append_alert(&self, row: &AlertRow) -> Result<(), EngineError> {
        self.append_ndjson("alerts.ndjson", row).await
    }

    pub async fn append_path(&self, row: &PathRow) -> Result<(), EngineError> {
        self.append_ndjson("paths.ndjson", row).await
    }

    pub async fn append_trade(&self, row: &TradeRow) -> Result<(), EngineError> {
        self.append_ndjson("trades.ndjson", row).await
    }

    pub async fn append_per_caller(&self, row: &PerCallerRow) -> Result<(), EngineError> {
        self.append_ndjson("per_caller.ndjson", row).await
    }

    pub async fn append_error(&self, row: &ErrorRow) -> Result<(), EngineError> {
        self.append_ndjson("errors.ndjson", row).await
    }

    pub async fn write_matrix<T: Serialize>(&self, matrix: &T) -> Result<(), EngineError> {
        let path = self.root.join("matrix.json");
        let bytes = serde_json::to_vec_pretty(matrix).map_err(|e| EngineError::StorageFault(e.into()))?;
        fs::write(&path, bytes).await.map_err(|e| EngineError::StorageFault(e.into()))
    }

    /// Marks a scenario completed and rewrites the manifest. Called once
    /// every call's trade rows for that scenario have been appended, so a
    /// resumed run can skip it entirely.
    pub async fn mark_scenario_completed(&self, scenario_id: impl Into<String>) -> anyhow::Result<()> {
        let mut manifest = self.manifest.lock().await;
        manifest.completed_scenario_ids.insert(scenario_id.into());
        drop(manifest);
        self.write_manifest().await
    }

    pub async fn finalize_ok(&self, timing: Timing) -> anyhow::Result<()> {
        let mut manifest = self.manifest.lock().await;
        manifest.status = RunStatus::Ok;
        manifest.timing = timing;
        drop(manifest);
        self.write_manifest().await
    }

    pub async fn finalize_failed(&self, timing: Timing, reason: impl Into<String>) -> anyhow::Result<()> {
        let mut manifest = self.manifest.lock().await;
        manifest.status = RunStatus::Failed;
        manifest.timing = timing;
        manifest.failure_reason = Some(reason.into());
        drop(manifest);
        self.write_manifest().await
    }

    async fn write_manifest(&self) -> anyhow::Result<()> {
        let manifest = self.manifest.lock().await;
        let bytes = serde_json::to_vec_pretty(&*manifest).context("failed to serialise manifest")?;
        drop(manifest);
        let path = self.root.join("manifest.json");
        // Retried up to three times: the only retryable fault per the error
        // handling design is a transient write of the manifest itself.
        let mut attempt = 0;
        loop {
            match fs::write(&path, &bytes).await {
                Ok(()) => return Ok(()),
                Err(_) if attempt < 2 => {
                    attempt += 1;
                    tokio::time::sleep(std::time::Duration::from_millis(50 * attempt)).await;
                }
                Err(e) => return Err(e).with_context(|| format!("failed to write {}", path.display())),
            }
        }
    }

    async fn append_ndjson<T: Serialize>(&self, filename: &str, row: &T) -> Result<(), EngineError> {
        let mut line = serde_json::to_vec(row).map_err(|e| EngineError::StorageFault(e.into()))?;
        line.push(b'\n');
        let path = self.root.join(filename);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| EngineError::StorageFault(e.into()))?;
        file.write_all(&line).await.map_err(|e| EngineError::StorageFault(e.into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Interval;

    fn git() -> GitInfo {
        GitInfo { commit: "deadbeef".into(), branch: "main".into(), dirty: false }
    }

    fn dataset() -> DatasetInfo {
        DatasetInfo {
            from_iso: "2026-01-01T00:00:00Z".into(),
            to_iso: "2026-01-02T00:00:00Z".into(),
            interval: Interval::M1,
            calls_count: 1,
        }
    }

    #[tokio::test]
    async fn create_then_resume_round_trips_completed_ids() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(dir.path(), "run-1", git(), dataset(), "hash-1").await.unwrap();
        writer.mark_scenario_completed("scenario-a").await.unwrap();
        drop(writer);

        let resumed = ArtifactWriter::resume(dir.path(), "hash-1").await.unwrap();
        let ids = resumed.completed_scenario_ids().await;
        assert!(ids.contains("scenario-a"));
    }

    #[tokio::test]
    async fn resume_rejects_mismatched_config_hash() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(dir.path(), "run-1", git(), dataset(), "hash-1").await.unwrap();
        drop(writer);

        let err = ArtifactWriter::resume(dir.path(), "hash-2").await.unwrap_err();
        assert!(err.to_string().contains("config hash"));
    }

    #[tokio::test]
    async fn append_alert_writes_one_ndjson_line() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::create(dir.path(), "run-1", git(), dataset(), "hash-1").await.unwrap();
        writer
            .append_alert(&AlertRow {
                call_id: "call-1".into(),
                mint: "MINT".into(),
                caller_name: "caller".into(),
                chain: "sol".into(),
                alert_ts_ms: 0,
                created_at: "2026-01-01T00:00:00Z".into(),
            })
            .await
            .unwrap();

        let contents = std::fs::read_to_string(dir.path().join("alerts.ndjson")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
