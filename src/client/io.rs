//! Low-level I/O operations for NNTP protocol communication
//!
//! This module provides the core I/O primitives used by all NNTP client operations:
//! - Command transmission with logging
//! - Single-line response parsing
//! - Multi-line response handling (text and binary)
//! - Timeout management
//! - Connection error detection

use super::NntpClient;
use crate::commands;
use crate::error::{NntpError, Result};
use crate::response::NntpResponse;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::trace;

const BINARY_DATA_INITIAL_CAPACITY: usize = 512 * 1024;

/// Strip NNTP byte-stuffing from a line (leading ".." becomes ".").
fn strip_byte_stuffing(line: &str) -> &str {
    if line.starts_with("..") {
        &line[1..]
    } else {
        line
    }
}

impl NntpClient {
    /// This connection's configured per-command timeout (`Provider::article_timeout_ms`,
    /// default 15s). Applied independently to every line read so it resets on each
    /// byte received rather than bounding the whole multi-line transfer.
    pub(super) fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.config.command_timeout_ms)
    }

    /// Send a command to the server
    pub(super) async fn send_command(&mut self, command: &str) -> Result<()> {
        trace!("Sending command: {}", command.trim());
        self.stream.get_mut().write_all(command.as_bytes()).await?;
        self.stream.get_mut().flush().await?;
        Ok(())
    }

    /// Read a single-line response
    pub(super) async fn read_response(&mut self) -> Result<NntpResponse> {
        let result = self.read_response_with_timeout(self.command_timeout()).await;
        // Mark connection as broken if we got invalid/garbage data
        if let Err(NntpError::InvalidResponse(_)) = &result {
            self.mark_broken();
        }
        result
    }

    /// Read a single-line response with custom timeout
    pub(super) async fn read_response_with_timeout(
        &mut self,
        timeout_duration: Duration,
    ) -> Result<NntpResponse> {
        use tokio::io::AsyncBufReadExt;

        let read_future = async {
            let mut line_bytes = Vec::with_capacity(512);
            self.stream.read_until(b'\n', &mut line_bytes).await?;

            if line_bytes.is_empty() {
                return Err(NntpError::ConnectionClosed);
            }

            // Convert to string with lossy UTF-8 conversion
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end();
            trace!("Received: {}", line);

            commands::parse_single_response(line)
        };

        timeout(timeout_duration, read_future)
            .await
            .map_err(|_| NntpError::Timeout)?
    }

    /// Read a multi-line response (ending with ".\r\n")
    pub(super) async fn read_multiline_response(&mut self) -> Result<NntpResponse> {
        let result = self
            .read_multiline_response_with_timeout(self.command_timeout())
            .await;
        // Mark connection as broken if we got invalid/garbage data
        if let Err(NntpError::InvalidResponse(_)) = &result {
            self.mark_broken();
        }
        result
    }

    /// Read a multi-line response with custom timeout.
    ///
    /// The timeout is applied independently to each line read, so it resets
    /// every time bytes arrive instead of bounding the whole transfer.
    pub(super) async fn read_multiline_response_with_timeout(
        &mut self,
        timeout_duration: Duration,
    ) -> Result<NntpResponse> {
        use tokio::io::AsyncBufReadExt;

        let result: Result<NntpResponse> = async {
            // Read first line (status)
            let mut first_line_bytes = Vec::with_capacity(512);
            timeout(
                timeout_duration,
                self.stream.read_until(b'\n', &mut first_line_bytes),
            )
            .await
            .map_err(|_| NntpError::Timeout)??;

            if first_line_bytes.is_empty() {
                return Err(NntpError::ConnectionClosed);
            }

            let first_line = String::from_utf8_lossy(&first_line_bytes);
            let first_line = first_line.trim_end();
            trace!("Received: {}", first_line);

            let (code, message) = commands::parse_response_line(first_line)?;

            // If error response, no multi-line data follows
            if code >= 400 {
                return Ok(NntpResponse {
                    code,
                    message,
                    lines: vec![],
                });
            }

            // Read line-by-line. Pre-allocate with a conservative estimate
            // (most multiline responses have 10-100 lines).
            let mut lines = Vec::with_capacity(64);
            loop {
                let mut line_bytes = Vec::with_capacity(512);
                timeout(
                    timeout_duration,
                    self.stream.read_until(b'\n', &mut line_bytes),
                )
                .await
                .map_err(|_| NntpError::Timeout)??;

                if line_bytes.is_empty() {
                    return Err(NntpError::ConnectionClosed);
                }

                let line = String::from_utf8_lossy(&line_bytes);
                let line = line.trim_end();

                // Check for terminator
                if line == "." {
                    break;
                }

                // Handle byte-stuffing (lines starting with ".." become ".")
                lines.push(strip_byte_stuffing(line).to_string());
            }

            Ok(NntpResponse {
                code,
                message,
                lines,
            })
        }
        .await;

        result
    }

    /// Read a multi-line response as a sequence of raw, un-dot-stuffed lines.
    ///
    /// Unlike [`read_multiline_response`](Self::read_multiline_response), lines are
    /// kept as raw bytes rather than lossily reinterpreted as UTF-8, so yEnc payload
    /// bytes above 0x7F survive intact. Line boundaries are preserved (one `Vec<u8>`
    /// per wire line, CRLF stripped) so a yEnc decoder can process them one at a time.
    pub(super) async fn read_body_lines(&mut self) -> Result<(u16, String, Vec<Vec<u8>>)> {
        let result = self.read_body_lines_with_timeout(self.command_timeout()).await;
        if let Err(NntpError::InvalidResponse(_)) = &result {
            self.mark_broken();
        }
        result
    }

    /// Read a multi-line response as raw lines, with a custom timeout
    pub(super) async fn read_body_lines_with_timeout(
        &mut self,
        timeout_duration: Duration,
    ) -> Result<(u16, String, Vec<Vec<u8>>)> {
        let (code, message) = self.begin_body_lines_with_timeout(timeout_duration).await?;

        if code >= 400 {
            return Ok((code, message, vec![]));
        }

        let mut lines = Vec::with_capacity(64);
        while let Some(line) = self.next_body_line_with_timeout(timeout_duration).await? {
            lines.push(line);
        }

        Ok((code, message, lines))
    }

    /// Read just the status line of a BODY/ARTICLE response, leaving the body to be
    /// drained one line at a time via [`next_body_line`](Self::next_body_line).
    ///
    /// This is the lazy counterpart to [`read_body_lines`](Self::read_body_lines): no
    /// body line is pulled off the wire until the caller asks for the next one, so a
    /// decoder/writer that falls behind naturally pauses the transport instead of the
    /// whole article being buffered up front.
    pub(super) async fn begin_body_lines(&mut self) -> Result<(u16, String)> {
        self.begin_body_lines_with_timeout(self.command_timeout())
            .await
    }

    /// Read the status line of a body response, with a custom timeout.
    pub(super) async fn begin_body_lines_with_timeout(
        &mut self,
        timeout_duration: Duration,
    ) -> Result<(u16, String)> {
        use tokio::io::AsyncBufReadExt;

        let result: Result<(u16, String)> = async {
            let mut first_line_bytes = Vec::with_capacity(256);
            timeout(
                timeout_duration,
                self.stream.read_until(b'\n', &mut first_line_bytes),
            )
            .await
            .map_err(|_| NntpError::Timeout)??;

            if first_line_bytes.is_empty() {
                return Err(NntpError::ConnectionClosed);
            }

            let first_line = String::from_utf8_lossy(&first_line_bytes);
            let first_line = first_line.trim_end();
            trace!("Received: {}", first_line);

            commands::parse_response_line(first_line)
        }
        .await;

        if let Err(NntpError::InvalidResponse(_)) = &result {
            self.mark_broken();
        }
        result
    }

    /// Read one raw, un-dot-stuffed body line following [`begin_body_lines`](Self::begin_body_lines).
    /// Returns `Ok(None)` once the terminator line is seen.
    pub(crate) async fn next_body_line(&mut self) -> Result<Option<Vec<u8>>> {
        self.next_body_line_with_timeout(self.command_timeout())
            .await
    }

    /// Read one raw body line with a custom timeout, reset fresh for this single line.
    pub(super) async fn next_body_line_with_timeout(
        &mut self,
        timeout_duration: Duration,
    ) -> Result<Option<Vec<u8>>> {
        use tokio::io::AsyncBufReadExt;

        let mut line_bytes = Vec::with_capacity(512);
        timeout(
            timeout_duration,
            self.stream.read_until(b'\n', &mut line_bytes),
        )
        .await
        .map_err(|_| NntpError::Timeout)??;

        if line_bytes.is_empty() {
            return Err(NntpError::ConnectionClosed);
        }

        let content_end = if line_bytes.ends_with(b"\r\n") {
            line_bytes.len() - 2
        } else if line_bytes.ends_with(b"\n") {
            line_bytes.len() - 1
        } else {
            line_bytes.len()
        };
        let line_content = &line_bytes[..content_end];

        if line_content == b"." {
            return Ok(None);
        }

        if line_content.starts_with(b"..") {
            Ok(Some(line_content[1..].to_vec()))
        } else {
            Ok(Some(line_content.to_vec()))
        }
    }

    /// Read a multi-line response as raw binary data (optimized for articles)
    ///
    /// This method is optimized for high-throughput binary data like articles:
    /// - Uses chunked reads instead of line-by-line
    /// - Returns raw bytes instead of Vec<String>
    /// - Avoids UTF-8 validation overhead
    /// - Pre-allocates buffer for reduced allocations
    pub(super) async fn read_multiline_response_binary(
        &mut self,
    ) -> Result<crate::response::NntpBinaryResponse> {
        self.read_multiline_response_binary_with_timeout(self.command_timeout())
            .await
    }

    /// Read a multi-line response as raw binary with custom timeout
    pub(super) async fn read_multiline_response_binary_with_timeout(
        &mut self,
        timeout_duration: Duration,
    ) -> Result<crate::response::NntpBinaryResponse> {
        use tokio::io::AsyncBufReadExt;

        let result: Result<crate::response::NntpBinaryResponse> = async {
            // Read first line (status) - this is always text
            let mut first_line_bytes = Vec::with_capacity(256);
            timeout(
                timeout_duration,
                self.stream.read_until(b'\n', &mut first_line_bytes),
            )
            .await
            .map_err(|_| NntpError::Timeout)??;

            if first_line_bytes.is_empty() {
                return Err(NntpError::ConnectionClosed);
            }

            let first_line = String::from_utf8_lossy(&first_line_bytes);
            let first_line = first_line.trim_end();
            trace!("Received: {}", first_line);

            let (code, message) = commands::parse_response_line(first_line)?;

            // If error response, no multi-line data follows
            if code >= 400 {
                return Ok(crate::response::NntpBinaryResponse {
                    code,
                    message,
                    data: vec![],
                });
            }

            // Optimized binary read: use read_until for efficient buffered I/O
            // but collect bytes directly instead of creating strings
            let mut data = Vec::with_capacity(BINARY_DATA_INITIAL_CAPACITY);

            loop {
                let mut line_bytes = Vec::with_capacity(512);
                timeout(
                    timeout_duration,
                    self.stream.read_until(b'\n', &mut line_bytes),
                )
                .await
                .map_err(|_| NntpError::Timeout)??;

                if line_bytes.is_empty() {
                    return Err(NntpError::ConnectionClosed);
                }

                // Check for terminator: line containing only "." (plus CRLF/LF)
                if line_bytes == b".\r\n" || line_bytes == b".\n" {
                    break;
                }

                // Strip trailing \r\n (NNTP line terminator, not part of payload)
                let content_end = if line_bytes.ends_with(b"\r\n") {
                    line_bytes.len() - 2
                } else if line_bytes.ends_with(b"\n") {
                    line_bytes.len() - 1
                } else {
                    line_bytes.len()
                };
                let line_content = &line_bytes[..content_end];

                // Handle dot-stuffing: lines starting with ".." become "."
                if line_content.starts_with(b"..") {
                    data.extend_from_slice(&line_content[1..]);
                } else {
                    data.extend_from_slice(line_content);
                }
            }

            Ok(crate::response::NntpBinaryResponse {
                code,
                message,
                data,
            })
        }
        .await;

        // Mark connection as broken if we got invalid data
        if let Err(NntpError::InvalidResponse(_)) = &result {
            self.mark_broken();
        }

        result
    }
}
