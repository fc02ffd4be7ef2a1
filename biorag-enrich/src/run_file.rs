//! The per-run checkpoint file: `outputs/batch_<YYYYMMDD_HHMMSS>.json`,
//! carrying enough state to resume a killed batch without re-enriching
//! already-completed stubs.
//!
//! Grounded on `batch_enrich_full.py`'s `_latest_output_file` /
//! `_load_output_file` / `_new_output_path` / `_save_output` and its
//! resume-decision rule: a file counts as resumable only if it has a
//! `results` map but no `completed_at` timestamp yet.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EnrichError;
use crate::proposal::EnrichmentProposal;

/// CLI arguments worth recording alongside the run, purely for the
/// after-the-fact summary — never read back to change behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunArgs {
    pub meta_types: Vec<String>,
    pub workers: usize,
    pub no_llm: bool,
    pub limit: Option<usize>,
}

/// The full checkpoint document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFile {
    pub run_id: String,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub args: RunArgs,
    pub total_stubs: usize,
    pub processed: usize,
    pub results: HashMap<String, EnrichmentProposal>,
}

impl RunFile {
    pub fn new(output_path: PathBuf, run_id: String, args: RunArgs, total_stubs: usize) -> Self {
        Self {
            run_id,
            output_path,
            started_at: Utc::now(),
            completed_at: None,
            args,
            total_stubs,
            processed: 0,
            results: HashMap::new(),
        }
    }

    /// Resumable iff the file has results recorded but was never marked
    /// complete — matches `_latest_output_file`'s filter in the original.
    pub fn is_resumable(&self) -> bool {
        self.completed_at.is_none()
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, EnrichError> {
        let path = path.as_ref();
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| EnrichError::Io { path: path.to_path_buf(), source })?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn save(&self) -> Result<(), EnrichError> {
        biorag_store::atomic::write_json_atomic(&self.output_path, self).await?;
        Ok(())
    }

    pub fn mark_complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }
}

/// `outputs/batch_<YYYYMMDD_HHMMSS>.json` under `base_dir`.
pub fn new_output_path(base_dir: impl AsRef<Path>, now: DateTime<Utc>) -> PathBuf {
    base_dir
        .as_ref()
        .join("outputs")
        .join(format!("batch_{}.json", now.format("%Y%m%d_%H%M%S")))
}

/// Scans `base_dir/outputs` for `batch_*.json` files and returns the most
/// recently modified one that is still resumable, if any. Unreadable or
/// malformed files are skipped rather than failing the scan — a single
/// corrupt checkpoint shouldn't block picking up an older valid one.
pub async fn find_latest_resumable(base_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let outputs_dir = base_dir.as_ref().join("outputs");
    let mut entries = tokio::fs::read_dir(&outputs_dir).await.ok()?;

    let mut candidates: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_batch_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("batch_") && n.ends_with(".json"));
        if !is_batch_file {
            continue;
        }
        let Ok(metadata) = entry.metadata().await else { continue };
        let Ok(modified) = metadata.modified() else { continue };
        candidates.push((modified, path));
    }

    candidates.sort_by_key(|(modified, _)| *modified);

    while let Some((_, path)) = candidates.pop() {
        if let Ok(run_file) = RunFile::load(&path).await {
            if run_file.is_resumable() {
                return Some(path);
            }
        }
    }
    None
}
