//! Engine façade: the thing a caller actually constructs.
//!
//! Owns one connection pool per configured provider, the shared
//! [`EngineConfig`], the history store, and the job registry. Fans
//! `submit`/`cancel`/`pause`/`delete` calls out to per-job orchestrators
//! and exposes a [`broadcast`] channel of [`DownloadEvent`]s.

use crate::config::{EngineConfig, Provider};
use crate::downloader::SegmentDownloader;
use crate::error::{NntpError, Result};
use crate::fallback::FallbackPolicy;
use crate::history::{HistoryEntry, HistoryStore};
use crate::nzb::Nzb;
use crate::orchestrator::{DownloadJob, JobOrchestrator};
use crate::pool::NntpPool;
use crate::status::{DownloadEvent, DownloadItem, DownloadState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error};
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 256;

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

struct TrackedJob {
    job: Arc<Mutex<DownloadJob>>,
    orchestrator: Arc<JobOrchestrator>,
}

/// The download engine: the inbound surface a caller constructs and talks to.
pub struct Engine {
    config: EngineConfig,
    providers: HashMap<String, Provider>,
    downloader: Arc<SegmentDownloader>,
    history: HistoryStore,
    events: broadcast::Sender<DownloadEvent>,
    jobs: Mutex<HashMap<String, TrackedJob>>,
    job_sequence: AtomicU64,
}

impl Engine {
    /// Build an engine from its provider chain (primary first) and shared
    /// config. One [`NntpPool`] is created per provider.
    pub async fn new(providers: Vec<Provider>, config: EngineConfig) -> Result<Self> {
        if providers.is_empty() {
            return Err(NntpError::Config(
                "at least one provider is required".to_string(),
            ));
        }

        let mut pools = HashMap::new();
        let mut by_id = HashMap::new();
        for provider in &providers {
            let pool = NntpPool::new(provider.server_config(), provider.max_connections).await?;
            pools.insert(provider.id.clone(), Arc::new(pool));
            by_id.insert(provider.id.clone(), provider.clone());
        }

        let mut providers_iter = providers.into_iter();
        let primary = providers_iter.next().expect("checked non-empty above");
        let fallbacks = providers_iter.collect();
        let fallback_policy = FallbackPolicy::new(primary, fallbacks);
        let downloader = Arc::new(SegmentDownloader::new(pools, fallback_policy));

        let history_path = config.download_directory.join(".history.json");
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            providers: by_id,
            downloader,
            history: HistoryStore::new(history_path),
            events,
            jobs: Mutex::new(HashMap::new()),
            job_sequence: AtomicU64::new(0),
        })
    }

    /// Subscribe to this engine's event bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.events.subscribe()
    }

    /// Submit a parsed NZB as a new job under `name`, returning its job id.
    /// Rejects malformed NZBs (no files, a file with zero segments) before
    /// any network activity.
    pub async fn submit(&self, name: impl Into<String>, nzb: Nzb) -> Result<String> {
        nzb.validate()
            .map_err(|e| NntpError::Config(format!("invalid NZB: {e}")))?;

        let name = name.into();
        let seq = self.job_sequence.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}-{}", Uuid::new_v4(), seq);
        let save_path = self.config.download_directory.join(&id);

        let job = DownloadJob::new(id.clone(), name, save_path, nzb);
        let orchestrator = Arc::new(JobOrchestrator::new(
            self.downloader.clone(),
            self.config.clone(),
            self.events.clone(),
        ));
        let job = Arc::new(Mutex::new(job));

        self.jobs.lock().await.insert(
            id.clone(),
            TrackedJob {
                job: job.clone(),
                orchestrator: orchestrator.clone(),
            },
        );

        let history = self.history_clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            let mut guard = job.lock().await;
            if let Err(e) = orchestrator.run(&mut guard).await {
                error!("job {} ended with error: {}", job_id, e);
                guard.status = DownloadState::Failed;
            }
            if guard.status.is_terminal() {
                let entry = HistoryEntry {
                    id: guard.id.clone(),
                    name: guard.name.clone(),
                    save_path: guard.save_path.clone(),
                    total_size: guard.total_size,
                    status: guard.status,
                    start_time: guard.start_time,
                    end_time: now_unix(),
                    provider_name: "primary".to_string(),
                };
                if let Err(e) = history.append(entry).await {
                    error!("failed to persist history for job {}: {}", job_id, e);
                }
            }
        });

        debug!("submitted job {}", id);
        Ok(id)
    }

    /// Cancel a job: stops dispatch, transitions it to `Deleted`.
    pub async fn cancel(&self, job_id: &str) -> Result<()> {
        let jobs = self.jobs.lock().await;
        let tracked = jobs
            .get(job_id)
            .ok_or_else(|| NntpError::Config(format!("unknown job {}", job_id)))?;
        tracked.orchestrator.cancel();
        Ok(())
    }

    /// Suspend dispatch of new segments for a job.
    pub async fn pause(&self, job_id: &str) -> Result<bool> {
        let jobs = self.jobs.lock().await;
        let tracked = jobs
            .get(job_id)
            .ok_or_else(|| NntpError::Config(format!("unknown job {}", job_id)))?;
        Ok(tracked.orchestrator.pause())
    }

    /// Resume a paused job.
    pub async fn resume(&self, job_id: &str) -> Result<()> {
        let jobs = self.jobs.lock().await;
        let tracked = jobs
            .get(job_id)
            .ok_or_else(|| NntpError::Config(format!("unknown job {}", job_id)))?;
        tracked.orchestrator.resume();
        Ok(())
    }

    /// Delete a job, optionally removing any files it produced.
    pub async fn delete(&self, job_id: &str, remove_files: bool) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        let tracked = jobs
            .remove(job_id)
            .ok_or_else(|| NntpError::Config(format!("unknown job {}", job_id)))?;
        tracked.orchestrator.cancel();

        if remove_files {
            let job = tracked.job.lock().await;
            let _ = tokio::fs::remove_dir_all(&job.save_path).await;
        }
        Ok(())
    }

    /// A snapshot of a job's current state, if it's still tracked in memory.
    pub async fn status(&self, job_id: &str) -> Option<DownloadItem> {
        let jobs = self.jobs.lock().await;
        let tracked = jobs.get(job_id)?;
        let job = tracked.job.lock().await;
        Some(DownloadItem {
            id: job.id.clone(),
            filename: job.name.clone(),
            path: job.save_path.clone(),
            status: job.status,
            total_bytes: job.total_size,
            transferred_bytes: job.downloaded_bytes,
            speed: job.speed,
            provider_name: "primary".to_string(),
            external_id: None,
        })
    }

    /// All providers this engine was configured with, by id.
    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.providers.get(id)
    }

    /// Pre-warm every provider's connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider's pool fails to open its warmup
    /// connections.
    pub async fn initialize(&self) -> Result<()> {
        self.downloader.initialize().await
    }

    /// Close every provider's connection pool. Jobs still in flight will
    /// fail their next segment request once their pool refuses further
    /// checkouts.
    pub async fn shutdown(&self) {
        self.downloader.shutdown().await;
    }

    fn history_clone(&self) -> HistoryStore {
        HistoryStore::new(self.history.path().to_path_buf())
    }
}
