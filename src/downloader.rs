//! Segment downloader: wires a request through the connection pool,
//! decodes through the streaming yEnc decoder, and honors the fallback
//! policy's retry and provider-switching rules.

use crate::error::{NntpError, Result};
use crate::fallback::FallbackPolicy;
use crate::pool::NntpPool;
use crate::yenc::{YencMetadata, YencStreamDecoder};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{trace, warn};

/// High-water mark for the decode/write credit scheme in [`SegmentDownloader::attempt`]:
/// the reader may be this many undrained decoded bytes ahead of the writer
/// before it pauses pulling more lines off the wire.
const WRITE_CREDIT_BYTES: usize = 1024 * 1024;

/// Outcome of downloading and decoding one segment.
#[derive(Debug)]
pub struct DecodedSegment {
    /// yEnc metadata resolved from the segment's trailer.
    pub metadata: YencMetadata,
    /// Decoded bytes, present only when no `destination_path` was given.
    pub data: Option<Vec<u8>>,
    /// Whether the trailer's CRC matched the decoded bytes (`true` when no
    /// CRC field was present to check against).
    pub crc_valid: bool,
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Downloads individual segments by message-id, retrying and falling back
/// across providers per [`FallbackPolicy`].
///
/// Holds one [`NntpPool`] per provider in the fallback chain; the fallback
/// policy itself is serialized behind a [`Mutex`] since many
/// `download_segment` calls may run concurrently against the same downloader.
pub struct SegmentDownloader {
    pools: HashMap<String, Arc<NntpPool>>,
    fallback: Mutex<FallbackPolicy>,
}

impl SegmentDownloader {
    /// Build a downloader from per-provider pools and the fallback policy
    /// that governs their ordering. `pools` must contain an entry for every
    /// provider id in `fallback.chain()`.
    pub fn new(pools: HashMap<String, Arc<NntpPool>>, fallback: FallbackPolicy) -> Self {
        Self {
            pools,
            fallback: Mutex::new(fallback),
        }
    }

    /// Pre-warm every provider's pool.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider's pool fails to open its warmup
    /// connections.
    pub async fn initialize(&self) -> Result<()> {
        for pool in self.pools.values() {
            pool.initialize().await?;
        }
        Ok(())
    }

    /// Close every pool's connections and reject further use.
    pub async fn shutdown(&self) {
        for pool in self.pools.values() {
            pool.shutdown().await;
        }
    }

    /// Download and decode one segment.
    ///
    /// When `destination_path` is given, decoded bytes are streamed directly
    /// to that path and `DecodedSegment::data` is `None`; otherwise the
    /// decoded bytes are returned buffered in memory.
    pub async fn download_segment(
        &self,
        message_id: &str,
        destination_path: Option<&Path>,
    ) -> Result<DecodedSegment> {
        loop {
            let provider = {
                let mut fallback = self.fallback.lock().await;
                fallback.current_provider(message_id).clone()
            };

            let retryable = {
                let fallback = self.fallback.lock().await;
                fallback.should_retry(message_id, &provider.id)
            };

            if !retryable {
                let advanced = {
                    let mut fallback = self.fallback.lock().await;
                    fallback.next_provider(message_id).is_some()
                };
                if advanced {
                    continue;
                }
                return Err(NntpError::Exhausted {
                    message_id: message_id.to_string(),
                    reason: "all providers exhausted their retry budget".to_string(),
                });
            }

            let pool = self.pools.get(&provider.id).ok_or_else(|| {
                NntpError::Config(format!("no connection pool configured for provider {}", provider.id))
            })?;

            match self
                .attempt(pool.as_ref(), message_id, destination_path)
                .await
            {
                Ok(segment) => {
                    let mut fallback = self.fallback.lock().await;
                    fallback.record_success(message_id, &provider.id, now_unix());
                    return Ok(segment);
                }
                Err(e) => {
                    warn!(
                        "segment {} failed on provider {}: {}",
                        message_id, provider.id, e
                    );
                    let backoff = {
                        let mut fallback = self.fallback.lock().await;
                        fallback.record_failure(message_id, &provider.id);
                        fallback.backoff(message_id, &provider.id)
                    };
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        pool: &NntpPool,
        message_id: &str,
        destination_path: Option<&Path>,
    ) -> Result<DecodedSegment> {
        trace!("requesting segment {}", message_id);
        let mut conn = pool.get().await?;
        conn.begin_body_stream(message_id).await?;

        let mut decoder = YencStreamDecoder::new();
        let mut metadata = None;

        let data = match destination_path {
            Some(path) => {
                self.stream_to_disk(&mut conn, message_id, path, &mut decoder, &mut metadata)
                    .await?;
                None
            }
            None => {
                let mut data = Vec::new();
                while let Some(line) = conn.next_body_line().await? {
                    if let Some(meta) = decoder.feed_line(&line)? {
                        metadata = Some(meta);
                    }
                    data.extend_from_slice(&decoder.take_data());
                }
                Some(data)
            }
        };
        drop(conn);

        let metadata = metadata.ok_or_else(|| {
            NntpError::InvalidResponse(format!("segment {} had no yEnc trailer", message_id))
        })?;
        let crc_valid = metadata.crc_valid.unwrap_or(true);

        Ok(DecodedSegment {
            metadata,
            data,
            crc_valid,
        })
    }

    /// Drain the decoder line-by-line straight to `path`, pausing the reader
    /// whenever the writer falls more than [`WRITE_CREDIT_BYTES`] behind so a
    /// multi-hundred-MB article is never held fully in memory.
    ///
    /// The reader (this loop) and the writer (a spawned task) run
    /// concurrently, connected by an unbounded channel; a [`Semaphore`]
    /// carries the write credit between them. The reader acquires credit
    /// before handing a chunk to the writer and forgets the permit; the
    /// writer returns that credit only after the bytes actually land on
    /// disk, so "pause" is a real consequence of the writer lagging, not a
    /// cosmetic cap on a sequential read-then-write.
    async fn stream_to_disk(
        &self,
        conn: &mut crate::client::NntpClient,
        message_id: &str,
        path: &Path,
        decoder: &mut YencStreamDecoder,
        metadata: &mut Option<YencMetadata>,
    ) -> Result<()> {
        let file = tokio::fs::File::create(path).await?;
        let credit = Arc::new(Semaphore::new(WRITE_CREDIT_BYTES));
        let (tx, mut rx) = mpsc::unbounded_channel::<(Vec<u8>, u32)>();

        let writer_credit = credit.clone();
        let writer = tokio::spawn(async move {
            let mut file = file;
            while let Some((chunk, borrowed)) = rx.recv().await {
                file.write_all(&chunk).await?;
                writer_credit.add_permits(borrowed as usize);
            }
            file.flush().await?;
            Ok::<(), NntpError>(())
        });

        let result: Result<()> = async {
            while let Some(line) = conn.next_body_line().await? {
                if let Some(meta) = decoder.feed_line(&line)? {
                    *metadata = Some(meta);
                }
                let chunk = decoder.take_data();
                if chunk.is_empty() {
                    continue;
                }

                // Cap the request at the total credit bank so a single
                // decoded chunk larger than the high-water mark can't
                // deadlock waiting for more permits than will ever exist;
                // the writer returns exactly what was borrowed, so the bank
                // stays conserved.
                let requested = chunk.len().min(WRITE_CREDIT_BYTES) as u32;
                let permit = credit
                    .clone()
                    .acquire_many_owned(requested)
                    .await
                    .map_err(|_| {
                        NntpError::Other(format!(
                            "writer task for segment {} ended early",
                            message_id
                        ))
                    })?;
                permit.forget();

                tx.send((chunk, requested)).map_err(|_| {
                    NntpError::Other(format!(
                        "writer task for segment {} ended early",
                        message_id
                    ))
                })?;
            }
            Ok(())
        }
        .await;

        drop(tx);
        let write_result = writer
            .await
            .map_err(|e| NntpError::Other(format!("writer task panicked: {}", e)))?;

        result?;
        write_result
    }
}
