//! Append-only JSON history of completed/failed downloads

use crate::error::Result;
use crate::status::DownloadState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A terminal job's persisted record, written once a job reaches a terminal
/// `DownloadState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    pub save_path: PathBuf,
    pub total_size: u64,
    pub status: DownloadState,
    pub start_time: u64,
    pub end_time: u64,
    pub provider_name: String,
}

/// JSON-array-file-backed history of terminal jobs, addressed by an opaque
/// job id. Not a database: lookups are a linear scan (no cross-job dedup,
/// no indexing).
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Open a history store backed by a JSON array file at `path`. The file
    /// is created on first append; it need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All records currently in the store. A missing or corrupt file is
    /// treated as empty rather than an error.
    pub async fn load(&self) -> Vec<HistoryEntry> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<HistoryEntry>>(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        "history file {:?} is corrupt, treating as empty: {}",
                        self.path, e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(
                    "could not read history file {:?}, treating as empty: {}",
                    self.path, e
                );
                Vec::new()
            }
        }
    }

    /// Append `entry`, rewriting the backing file. Load-then-rewrite is
    /// acceptable here: history only grows at job-completion rate, never on
    /// the per-segment hot path.
    pub async fn append(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.load().await;
        entries.push(entry);
        self.write_all(&entries).await
    }

    /// Look up a record by job id. Linear scan by design (see module docs).
    pub async fn find(&self, id: &str) -> Option<HistoryEntry> {
        self.load().await.into_iter().find(|e| e.id == id)
    }

    async fn write_all(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| crate::error::NntpError::Data(format!("failed to serialize history: {e}")))?;
        tokio::fs::write(&self.path, json).await?;
        debug!("wrote {} history entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
