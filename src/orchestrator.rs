//! Job orchestrator: owns one job end to end — dispatch segments to
//! the downloader, track progress, assemble finished files, emit status.

use crate::assembler::FileAssembler;
use crate::config::EngineConfig;
use crate::downloader::SegmentDownloader;
use crate::error::{NntpError, Result};
use crate::nzb::{Nzb, NzbFile, StoredSegment};
use crate::status::{DownloadEvent, DownloadState};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A submitted job's mutable state, owned exclusively by its orchestrator.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: String,
    pub name: String,
    pub save_path: PathBuf,
    pub files: Vec<NzbFile>,
    pub total_size: u64,
    pub status: DownloadState,
    pub downloaded_bytes: u64,
    pub start_time: u64,
    pub progress: f64,
    pub speed: f64,
    pub eta: Option<u64>,
}

impl DownloadJob {
    /// Build a queued job from a parsed NZB and a save path.
    pub fn new(id: impl Into<String>, name: impl Into<String>, save_path: impl Into<PathBuf>, nzb: Nzb) -> Self {
        let total_size = nzb.total_bytes();
        Self {
            id: id.into(),
            name: name.into(),
            save_path: save_path.into(),
            files: nzb.files,
            total_size,
            status: DownloadState::Queued,
            downloaded_bytes: 0,
            start_time: 0,
            progress: 0.0,
            speed: 0.0,
            eta: None,
        }
    }
}

/// Runs one [`DownloadJob`] to completion against a [`SegmentDownloader`],
/// emitting [`DownloadEvent`]s as it progresses.
pub struct JobOrchestrator {
    downloader: Arc<SegmentDownloader>,
    config: EngineConfig,
    events: broadcast::Sender<DownloadEvent>,
    paused: AtomicBool,
    cancelled: AtomicBool,
}

impl JobOrchestrator {
    pub fn new(
        downloader: Arc<SegmentDownloader>,
        config: EngineConfig,
        events: broadcast::Sender<DownloadEvent>,
    ) -> Self {
        Self {
            downloader,
            config,
            events,
            paused: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Suspend dispatch of new segments for this job. In-flight downloads
    /// are allowed to complete. Returns `true`.
    pub fn pause(&self) -> bool {
        self.paused.store(true, Ordering::SeqCst);
        true
    }

    /// Resume dispatch of new segments.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Cancel the job: in-flight segment downloads are left to fail
    /// naturally, no further segments are dispatched, and the job
    /// transitions to `Deleted`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    async fn wait_while_paused(&self) {
        while self.paused.load(Ordering::SeqCst) && !self.cancelled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    fn emit(&self, event: DownloadEvent) {
        // A send error only means there are no subscribers; not a failure.
        let _ = self.events.send(event);
    }

    /// Remove a file's spill directory and the job's `.segments` root
    /// (if now empty) after a segment failure. Best-effort: a leftover spill
    /// file or directory doesn't change the job's terminal state.
    async fn cleanup_failed_segments(&self, file_segments_dir: &PathBuf, segments_root: &PathBuf) {
        if let Err(e) = tokio::fs::remove_dir_all(file_segments_dir).await {
            warn!(
                "could not remove spill directory {:?} after failure: {}",
                file_segments_dir, e
            );
        }
        let _ = tokio::fs::remove_dir(segments_root).await;
    }

    fn progress_event(&self, job: &DownloadJob, provider_name: &str) -> DownloadEvent {
        DownloadEvent::Progress {
            id: job.id.clone(),
            filename: job.name.clone(),
            percent: job.progress,
            transferred_bytes: job.downloaded_bytes,
            total_bytes: job.total_size,
            status: job.status,
            speed: job.speed,
            provider_name: provider_name.to_string(),
            external_id: None,
            path: job.save_path.clone(),
        }
    }

    /// Run `job` to a terminal state.
    pub async fn run(&self, job: &mut DownloadJob) -> Result<()> {
        job.status = DownloadState::Downloading;
        job.start_time = now_unix();
        let mut last_emit = Instant::now();
        let mut last_sample = (Instant::now(), 0u64);
        let poll_interval = Duration::from_millis(self.config.status_poll_interval_ms);

        let segments_root = self.config.download_directory.join(".segments").join(&job.id);

        for (file_index, file) in job.files.clone().iter().enumerate() {
            if self.cancelled.load(Ordering::SeqCst) {
                job.status = DownloadState::Deleted;
                return Ok(());
            }

            let file_segments_dir = segments_root.join(file_index.to_string());
            tokio::fs::create_dir_all(&file_segments_dir).await?;

            let mut stored: HashMap<u32, StoredSegment> = HashMap::new();

            for segment in &file.segments {
                self.wait_while_paused().await;
                if self.cancelled.load(Ordering::SeqCst) {
                    job.status = DownloadState::Deleted;
                    return Ok(());
                }

                let spill_path = file_segments_dir.join(format!("{}.part", segment.number));
                let result = self
                    .downloader
                    .download_segment(&segment.message_id, Some(&spill_path))
                    .await;

                let decoded = match result {
                    Ok(decoded) => decoded,
                    Err(NntpError::Exhausted { message_id, reason }) => {
                        job.status = DownloadState::Failed;
                        self.cleanup_failed_segments(&file_segments_dir, &segments_root)
                            .await;
                        self.emit(DownloadEvent::Failed {
                            id: job.id.clone(),
                            filename: job.name.clone(),
                            reason: format!("segment {} exhausted: {}", message_id, reason),
                            provider_name: None,
                        });
                        return Ok(());
                    }
                    Err(e) => {
                        job.status = DownloadState::Failed;
                        self.cleanup_failed_segments(&file_segments_dir, &segments_root)
                            .await;
                        self.emit(DownloadEvent::Failed {
                            id: job.id.clone(),
                            filename: job.name.clone(),
                            reason: e.to_string(),
                            provider_name: None,
                        });
                        return Ok(());
                    }
                };

                if self.config.strict_crc && !decoded.crc_valid {
                    job.status = DownloadState::Failed;
                    self.cleanup_failed_segments(&file_segments_dir, &segments_root)
                        .await;
                    self.emit(DownloadEvent::Failed {
                        id: job.id.clone(),
                        filename: job.name.clone(),
                        reason: format!("CRC mismatch on segment {}", segment.number),
                        provider_name: None,
                    });
                    return Ok(());
                } else if !decoded.crc_valid {
                    warn!("CRC mismatch on segment {} of job {}", segment.number, job.id);
                }

                let size = tokio::fs::metadata(&spill_path).await?.len();
                stored.insert(
                    segment.number,
                    StoredSegment {
                        path: spill_path,
                        metadata: decoded.metadata,
                        size,
                    },
                );

                job.downloaded_bytes += segment.bytes;
                job.progress = if job.total_size > 0 {
                    job.downloaded_bytes as f64 / job.total_size as f64
                } else {
                    0.0
                };

                let (last_instant, last_bytes) = last_sample;
                let elapsed = last_instant.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    let instantaneous =
                        (job.downloaded_bytes.saturating_sub(last_bytes)) as f64 / elapsed;
                    job.speed = 0.3 * instantaneous + 0.7 * job.speed;
                }
                last_sample = (Instant::now(), job.downloaded_bytes);

                job.eta = if job.speed > 0.0 {
                    Some(((job.total_size.saturating_sub(job.downloaded_bytes)) as f64 / job.speed) as u64)
                } else {
                    None
                };

                if last_emit.elapsed() >= poll_interval {
                    self.emit(self.progress_event(job, "primary"));
                    last_emit = Instant::now();
                }
            }

            job.status = DownloadState::Assembling;
            let output_path = job.save_path.join(file.filename());
            FileAssembler::assemble(file, &stored, &output_path, &file_segments_dir).await?;
            job.status = DownloadState::Downloading;
            debug!("assembled file {:?} for job {}", output_path, job.id);
        }

        let _ = tokio::fs::remove_dir(&segments_root).await;

        job.status = DownloadState::Completed;
        self.emit(DownloadEvent::Completed {
            id: job.id.clone(),
            filename: job.name.clone(),
            path: job.save_path.clone(),
            timestamp: now_unix(),
            size: job.downloaded_bytes,
            provider_name: "primary".to_string(),
        });
        info!("job {} completed", job.id);
        Ok(())
    }
}
