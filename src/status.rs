//! Job/segment state machine and externally observable progress events

use serde::{Deserialize, Serialize};

/// Lifecycle states of a download job.
///
/// `Completed`, `Failed`, and `Deleted` are terminal: once reached, a job
/// never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Queued,
    Downloading,
    Paused,
    Assembling,
    Checking,
    Repairing,
    Extracting,
    Completed,
    Failed,
    Deleted,
}

impl DownloadState {
    /// Whether this state never transitions again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadState::Completed | DownloadState::Failed | DownloadState::Deleted
        )
    }
}

/// One in-flight or finished job's externally observable status, mirroring
/// the `download-progress`/`download-completed` outbound event fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: String,
    pub filename: String,
    pub path: std::path::PathBuf,
    pub status: DownloadState,
    pub total_bytes: u64,
    pub transferred_bytes: u64,
    pub speed: f64,
    pub provider_name: String,
    pub external_id: Option<String>,
}

impl DownloadItem {
    /// `transferred_bytes / total_bytes`, or `0.0` when `total_bytes` is zero.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.transferred_bytes as f64 / self.total_bytes as f64
        }
    }
}

/// Outbound event shapes emitted to subscribers of the engine's event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DownloadEvent {
    /// Progress update, coalesced to roughly `EngineConfig::status_poll_interval_ms`.
    Progress {
        id: String,
        filename: String,
        percent: f64,
        transferred_bytes: u64,
        total_bytes: u64,
        status: DownloadState,
        speed: f64,
        provider_name: String,
        external_id: Option<String>,
        path: std::path::PathBuf,
    },
    /// Emitted once, when a job reaches `Completed`. Never emitted on failure.
    Completed {
        id: String,
        filename: String,
        path: std::path::PathBuf,
        timestamp: u64,
        size: u64,
        provider_name: String,
    },
    /// Emitted once, when a job reaches `Failed`, carrying the first
    /// unrecoverable cause.
    Failed {
        id: String,
        filename: String,
        reason: String,
        provider_name: Option<String>,
    },
}

impl DownloadEvent {
    /// The job id this event concerns, regardless of variant.
    pub fn job_id(&self) -> &str {
        match self {
            DownloadEvent::Progress { id, .. } => id,
            DownloadEvent::Completed { id, .. } => id,
            DownloadEvent::Failed { id, .. } => id,
        }
    }
}
