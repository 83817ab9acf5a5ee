//! Streaming, line-at-a-time yEnc decoder.
//!
//! Drives the same header/escape/CRC arithmetic as the one-shot [`decode`](super::decode)
//! function but consumes one protocol body line at a time, so a segment download can
//! write decoded bytes as they arrive instead of buffering the whole article.

use crate::error::{NntpError, Result};
use crc32fast::Hasher;
use std::time::Duration;
use tokio::time::Instant;

use super::params::{parse_ybegin, parse_ypart, parse_yend};
use super::types::{YencHeader, YencPart};

/// Default time allowed between decoder construction and seeing the `=yend` trailer.
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    WaitBegin,
    InPart,
    InData,
    Finished,
}

/// Metadata resolved once a streaming decode reaches the `=yend` trailer.
///
/// Mirrors the source's `YencMetadata`: `begin` is the 1-based offset of this
/// part within the reassembled file when the part came from a multi-part encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct YencMetadata {
    pub line: u32,
    pub size: u64,
    pub name: String,
    pub part: Option<u32>,
    pub total: Option<u32>,
    pub part_size: Option<u64>,
    pub begin: Option<u64>,
    pub end_size: Option<u64>,
    pub pc32: Option<u32>,
    /// `None` when no crc32/pcrc32 trailer field was present to check against.
    pub crc_valid: Option<bool>,
}

/// Single-use streaming yEnc decoder: WAIT_BEGIN -> IN_PART -> IN_DATA -> FINISHED.
///
/// Feed protocol body lines (already un-dot-stuffed, CRLF stripped) one at a time
/// via [`feed_line`](Self::feed_line). Decoded bytes accumulate in an internal
/// buffer drainable with [`take_data`](Self::take_data). Carries a timeout between
/// construction and the trailer; `feed_line` fails with [`NntpError::Timeout`] once
/// expired.
pub struct YencStreamDecoder {
    state: DecoderState,
    header: Option<YencHeader>,
    part: Option<YencPart>,
    hasher: Hasher,
    data: Vec<u8>,
    deadline: Instant,
    last_was_escape: bool,
}

impl YencStreamDecoder {
    /// Create a decoder with the default 30s trailer timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_DECODE_TIMEOUT)
    }

    /// Create a decoder with a custom trailer timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            state: DecoderState::WaitBegin,
            header: None,
            part: None,
            hasher: Hasher::new(),
            data: Vec::new(),
            deadline: Instant::now() + timeout,
            last_was_escape: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == DecoderState::Finished
    }

    /// Decoded bytes accumulated so far, leaving the internal buffer empty.
    pub fn take_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// Feed one body line. Returns `Some(metadata)` once the trailer is parsed.
    pub fn feed_line(&mut self, line: &[u8]) -> Result<Option<YencMetadata>> {
        if Instant::now() >= self.deadline {
            return Err(NntpError::Timeout);
        }

        match self.state {
            DecoderState::WaitBegin => {
                if line.starts_with(b"=ybegin") {
                    self.header = Some(parse_ybegin(&String::from_utf8_lossy(line))?);
                    self.state = DecoderState::InPart;
                }
                Ok(None)
            }
            DecoderState::InPart => {
                if line.starts_with(b"=ypart") {
                    self.part = Some(parse_ypart(&String::from_utf8_lossy(line))?);
                    self.state = DecoderState::InData;
                    Ok(None)
                } else {
                    self.state = DecoderState::InData;
                    self.decode_data_line(line);
                    Ok(None)
                }
            }
            DecoderState::InData => {
                if line.starts_with(b"=yend") {
                    let trailer = parse_yend(&String::from_utf8_lossy(line))?;
                    self.state = DecoderState::Finished;

                    let header = self.header.take().ok_or_else(|| {
                        NntpError::InvalidResponse("yEnc trailer with no header".to_string())
                    })?;

                    let computed = self.hasher.clone().finalize();
                    let expected = trailer.pcrc32.or(trailer.crc32);
                    let crc_valid = expected.map(|e| e == computed);

                    Ok(Some(YencMetadata {
                        line: header.line,
                        size: header.size,
                        name: header.name,
                        part: header.part,
                        total: header.total,
                        part_size: self.part.as_ref().map(|p| p.end - p.begin + 1),
                        begin: self.part.as_ref().map(|p| p.begin),
                        end_size: Some(trailer.size),
                        pc32: expected,
                        crc_valid,
                    }))
                } else {
                    self.decode_data_line(line);
                    Ok(None)
                }
            }
            DecoderState::Finished => Err(NntpError::InvalidResponse(
                "yEnc decoder already finished".to_string(),
            )),
        }
    }

    /// Escape-decode one data line and feed it into the running CRC32 and buffer.
    ///
    /// Mirrors `decode_line_bytes`: a byte preceded by `=` is `(c - 64 - 42) & 0xFF`,
    /// otherwise `(c - 42) & 0xFF`.
    fn decode_data_line(&mut self, line: &[u8]) {
        let start = self.data.len();
        let mut escape = self.last_was_escape;
        for &byte in line {
            if byte == b'=' && !escape {
                escape = true;
                continue;
            }

            let decoded = if escape {
                byte.wrapping_sub(64).wrapping_sub(42)
            } else {
                byte.wrapping_sub(42)
            };
            escape = false;

            self.data.push(decoded);
        }
        self.last_was_escape = escape;
        self.hasher.update(&self.data[start..]);
    }
}

impl Default for YencStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
