//! Article retrieval and navigation commands (RFC 3977 §6.2)
//!
//! This module implements NNTP commands for fetching articles and navigating
//! within a newsgroup:
//! - ARTICLE - Fetch full article (headers + body)
//! - HEAD - Fetch headers only
//! - BODY - Fetch body only
//! - STAT - Check article status without retrieving content
//! - NEXT - Navigate to next article
//! - LAST - Navigate to previous article

use crate::{NntpError, NntpResponse, Result, commands, response::codes};
use tracing::trace;

use super::NntpClient;

impl NntpClient {
    /// Fetch article by message-ID or number
    ///
    /// Returns the full article (headers and body).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::NoSuchArticle`] - The article does not exist
    /// - [`NntpError::Protocol`] - Server returned an unexpected error
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn fetch_article(&mut self, id: &str) -> Result<NntpResponse> {
        trace!("Fetching article: {}", id);

        let cmd = commands::article(id);
        self.send_command(&cmd).await?;
        let response = self.read_multiline_response().await?;

        if response.code == codes::NO_SUCH_ARTICLE_ID
            || response.code == codes::NO_SUCH_ARTICLE_NUMBER
        {
            return Err(NntpError::NoSuchArticle(id.to_string()));
        }

        if !response.is_success() {
            return Err(NntpError::Protocol {
                code: response.code,
                message: response.message,
            });
        }

        Ok(response)
    }

    /// Fetch article headers only
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::NoSuchArticle`] - The article does not exist
    /// - [`NntpError::Protocol`] - Server returned an unexpected error
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn fetch_head(&mut self, id: &str) -> Result<NntpResponse> {
        trace!("Fetching head: {}", id);

        let cmd = commands::head(id);
        self.send_command(&cmd).await?;
        let response = self.read_multiline_response().await?;

        if !response.is_success() {
            return Err(NntpError::Protocol {
                code: response.code,
                message: response.message,
            });
        }

        Ok(response)
    }

    /// Fetch article body only
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::NoSuchArticle`] - The article does not exist
    /// - [`NntpError::Protocol`] - Server returned an unexpected error
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn fetch_body(&mut self, id: &str) -> Result<NntpResponse> {
        trace!("Fetching body: {}", id);

        let cmd = commands::body(id);
        self.send_command(&cmd).await?;
        let response = self.read_multiline_response().await?;

        if !response.is_success() {
            return Err(NntpError::Protocol {
                code: response.code,
                message: response.message,
            });
        }

        Ok(response)
    }

    /// Fetch article body as raw, un-dot-stuffed lines (byte-safe for yEnc)
    ///
    /// Unlike [`fetch_body`](Self::fetch_body), this preserves binary bytes
    /// above 0x7F instead of lossily reinterpreting them as UTF-8, which is
    /// required for decoding yEnc payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::NoSuchArticle`] - The article does not exist
    /// - [`NntpError::Protocol`] - Server returned an unexpected error
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn fetch_body_lines(&mut self, id: &str) -> Result<Vec<Vec<u8>>> {
        trace!("Fetching body lines: {}", id);

        let cmd = commands::body(id);
        self.send_command(&cmd).await?;
        let (code, message, lines) = self.read_body_lines().await?;

        if code == codes::NO_SUCH_ARTICLE_ID || code == codes::NO_SUCH_ARTICLE_NUMBER {
            return Err(NntpError::NoSuchArticle(id.to_string()));
        }

        if code < 200 || code >= 400 {
            return Err(NntpError::Protocol { code, message });
        }

        Ok(lines)
    }

    /// Begin a streaming BODY fetch: sends the command and reads only the
    /// status line, leaving the body to be drained one line at a time via
    /// [`NntpClient::next_body_line`]. Lets a caller pipe decode straight
    /// through to disk without ever holding the whole article in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::NoSuchArticle`] - The article does not exist
    /// - [`NntpError::Protocol`] - Server returned an unexpected error
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn begin_body_stream(&mut self, id: &str) -> Result<()> {
        trace!("Beginning body stream: {}", id);

        let cmd = commands::body(id);
        self.send_command(&cmd).await?;
        let (code, message) = self.begin_body_lines().await?;

        if code == codes::NO_SUCH_ARTICLE_ID || code == codes::NO_SUCH_ARTICLE_NUMBER {
            return Err(NntpError::NoSuchArticle(id.to_string()));
        }

        if code < 200 || code >= 400 {
            return Err(NntpError::Protocol { code, message });
        }

        Ok(())
    }

    /// Check article status without retrieving content (RFC 3977 §6.2.4)
    ///
    /// The STAT command allows checking whether an article exists and retrieving
    /// its metadata without downloading the full content. This is useful for
    /// checking article existence or getting message-id mapping.
    ///
    /// # Arguments
    ///
    /// * `id` - Either an article number (e.g., "12345") or message-id (e.g., "<abc@example.com>")
    ///
    /// # Returns
    ///
    /// Returns [`ArticleInfo`](crate::commands::ArticleInfo) containing:
    /// - `number`: Article number (0 if message-id was used in request)
    /// - `message_id`: The article's message identifier
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use usenet_engine::{NntpClient, ServerConfig};
    /// # use std::sync::Arc;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let config = ServerConfig::tls("news.example.com", "user", "pass");
    /// # let mut client = NntpClient::connect(Arc::new(config)).await?;
    /// # client.select_group("comp.lang.rust").await?;
    /// // Check by article number
    /// let info = client.stat("12345").await?;
    /// println!("Article {} has message-id: {}", info.number, info.message_id);
    ///
    /// // Check by message-id
    /// let info = client.stat("<abc@example.com>").await?;
    /// println!("Message exists at article number: {}", info.number);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::NoSuchArticle`] - Article does not exist (code 430)
    /// - [`NntpError::NoGroupSelected`] - No newsgroup selected (code 412)
    /// - [`NntpError::InvalidArticleNumber`] - Invalid article number (code 423)
    /// - [`NntpError::Protocol`] - Server returned an unexpected error
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn stat(&mut self, id: &str) -> Result<commands::ArticleInfo> {
        trace!("Checking article status: {}", id);

        let cmd = commands::stat(id);
        self.send_command(&cmd).await?;
        let response = self.read_response().await?;

        // Handle specific error codes
        if response.code == codes::NO_SUCH_ARTICLE_ID
            || response.code == codes::NO_SUCH_ARTICLE_NUMBER
        {
            return Err(NntpError::NoSuchArticle(id.to_string()));
        }

        if response.code == codes::NO_GROUP_SELECTED {
            return Err(NntpError::NoGroupSelected);
        }

        if response.code == codes::NO_CURRENT_ARTICLE {
            return Err(NntpError::InvalidArticleNumber);
        }

        // Parse the response
        commands::parse_stat_response(response)
    }
}
