//! File assembler: merges per-segment spill files into final output
//!
//! For each `NzbFile`, segments are merged in number order. A segment's
//! write offset comes from its yEnc `begin` field when present (multi-part
//! framing carries its own byte offset within the reassembled file);
//! otherwise segments are appended at a running cursor. Spill files are
//! deleted as they're consumed, and the per-job spill directory is removed
//! on a best-effort basis once the file is complete.

use crate::error::{NntpError, Result};
use crate::nzb::{NzbFile, StoredSegment};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Result of assembling one `NzbFile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOutcome {
    /// Total bytes written to the output file.
    pub bytes_written: u64,
}

/// Merges stored segments of one `NzbFile` into its final output file.
pub struct FileAssembler;

impl FileAssembler {
    /// Assemble `nzb_file`'s stored segments into `output_path`.
    ///
    /// `stored` must contain an entry for every segment number in
    /// `nzb_file.segments`; a missing entry is a caller bug (not all
    /// segments downloaded) and is reported as a [`NntpError::Data`] rather
    /// than panicking. `segments_dir` is the per-job spill directory removed
    /// after the last segment is consumed.
    pub async fn assemble(
        nzb_file: &NzbFile,
        stored: &HashMap<u32, StoredSegment>,
        output_path: &Path,
        segments_dir: &Path,
    ) -> Result<SegmentOutcome> {
        let mut numbers: Vec<u32> = nzb_file.segments.iter().map(|s| s.number).collect();
        numbers.sort_unstable();

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(output_path)
            .await?;

        let mut cursor: u64 = 0;

        for number in numbers {
            let stored_segment = stored.get(&number).ok_or_else(|| {
                NntpError::Data(format!(
                    "segment {} of {:?} was never stored",
                    number, output_path
                ))
            })?;

            let payload = tokio::fs::read(&stored_segment.path).await?;

            let offset = match stored_segment.metadata.begin {
                Some(begin) => begin.saturating_sub(1),
                None => cursor,
            };

            file.seek(std::io::SeekFrom::Start(offset)).await?;
            file.write_all(&payload).await?;
            cursor = cursor.max(offset + payload.len() as u64);

            tokio::fs::remove_file(&stored_segment.path).await?;
            debug!("merged segment {} at offset {}", number, offset);
        }

        file.flush().await?;

        if let Err(e) = tokio::fs::remove_dir(segments_dir).await {
            warn!(
                "could not remove spill directory {:?}: {}",
                segments_dir, e
            );
        }

        Ok(SegmentOutcome {
            bytes_written: cursor,
        })
    }
}
