//! Connection pooling for NNTP clients using bb8

use crate::client::NntpClient;
use crate::config::ServerConfig;
use crate::error::{NntpError, Result};
use bb8::{Pool, PooledConnection};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for connection retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff multiplier (exponential factor)
    pub backoff_multiplier: f64,
    /// Whether to add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a retry config with no retries (fail fast)
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Create a retry config with custom max retries
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }
}

/// Connection manager for bb8 pool
pub struct NntpConnectionManager {
    config: Arc<ServerConfig>,
}

impl NntpConnectionManager {
    /// Create a new connection manager
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait::async_trait]
impl bb8::ManageConnection for NntpConnectionManager {
    type Connection = NntpClient;
    type Error = NntpError;

    async fn connect(&self) -> Result<Self::Connection> {
        let mut client = NntpClient::connect(self.config.clone()).await?;

        // Anonymous providers carry no credentials; skip AUTHINFO entirely
        // rather than sending empty-string USER/PASS.
        if !self.config.username.is_empty() {
            client.authenticate().await?;
        }

        Ok(client)
    }

    async fn is_valid(&self, _conn: &mut Self::Connection) -> Result<()> {
        // For now, assume connection is valid
        // In the future, we could implement a STAT or similar check
        Ok(())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        // Check if connection received invalid/corrupted data
        conn.is_broken()
    }
}

/// NNTP connection pool with retry support
///
/// Provides high-performance connection pooling with:
/// - Automatic connection creation and authentication
/// - Exponential backoff with jitter on failures
/// - Broken connection detection and removal
///
/// # Example
///
/// ```no_run
/// use usenet_engine::{NntpPool, ServerConfig, RetryConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::tls("news.example.com", "user", "pass");
///
/// // Create pool with 10 connections and default retry config
/// let pool = NntpPool::new(config.clone(), 10).await?;
///
/// // Or with custom retry config
/// let retry_config = RetryConfig {
///     max_retries: 5,
///     initial_backoff_ms: 200,
///     ..Default::default()
/// };
/// let pool = NntpPool::with_retry_config(config, 10, retry_config).await?;
///
/// // Get connection from pool
/// let mut conn = pool.get().await?;
/// conn.select_group("alt.test").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NntpPool {
    pool: Pool<NntpConnectionManager>,
    retry_config: RetryConfig,
    max_size: u32,
    shut_down: AtomicBool,
}

impl NntpPool {
    /// Create a new NNTP connection pool with default retry configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `max_size` - Maximum number of connections in the pool
    pub async fn new(config: ServerConfig, max_size: u32) -> Result<Self> {
        Self::with_retry_config(config, max_size, RetryConfig::default()).await
    }

    /// Create a new NNTP connection pool with custom retry configuration
    pub async fn with_retry_config(
        config: ServerConfig,
        max_size: u32,
        retry_config: RetryConfig,
    ) -> Result<Self> {
        debug!(
            "Creating NNTP connection pool for {}:{} (max size: {}, max retries: {})",
            config.host, config.port, max_size, retry_config.max_retries
        );

        let manager = NntpConnectionManager::new(config);
        let pool = Pool::builder()
            .max_size(max_size)
            // Set connection timeout to 120 seconds (allows for slow NNTP servers)
            .connection_timeout(Duration::from_secs(120))
            // Set idle connection timeout to 5 minutes
            .idle_timeout(Some(Duration::from_secs(300)))
            .build(manager)
            .await
            .map_err(|e| NntpError::Other(format!("Failed to create pool: {}", e)))?;

        Ok(Self {
            pool,
            retry_config,
            max_size,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Pre-open up to `min(2, max_size)` connections so the pool's first
    /// real request doesn't pay a connection-setup penalty.
    ///
    /// # Errors
    ///
    /// Returns an error if a warmup connection could not be established.
    pub async fn initialize(&self) -> Result<()> {
        let warmup = std::cmp::min(2, self.max_size);
        debug!("warming up {} connection(s)", warmup);

        let mut warmed = Vec::with_capacity(warmup as usize);
        for _ in 0..warmup {
            warmed.push(self.get_no_retry().await?);
        }
        // Dropping returns each connection to the pool's idle set.
        drop(warmed);
        Ok(())
    }

    /// Close every connection this pool holds and reject any further
    /// `get`/`get_no_retry` calls.
    ///
    /// bb8 has no drain API, so idle connections are forced into the
    /// "broken" state and then returned to the pool, which causes bb8 to
    /// close and discard them on its next sweep rather than hand them back
    /// out. Connections currently checked out by other callers are closed
    /// as they're returned, since `shut_down` makes `has_broken` irrelevant
    /// to callers that already hold one: once they drop it, bb8 discards it
    /// because `mark_broken` is called on return below.
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);

        let idle = self.pool.state().idle_connections;
        for _ in 0..idle {
            if let Ok(mut conn) = self.pool.get().await {
                conn.mark_broken();
            } else {
                break;
            }
        }
        debug!("pool for {} shut down", self.pool.state().connections);
    }

    /// Get a connection from the pool with automatic retry on failure
    ///
    /// Uses exponential backoff with optional jitter to prevent thundering herd
    /// when multiple clients retry simultaneously.
    ///
    /// # Errors
    ///
    /// Returns [`NntpError::Other`] if all retry attempts fail, or
    /// [`NntpError::Other`] immediately if the pool has been shut down. The
    /// underlying error may be a connection failure, authentication
    /// failure, or pool exhaustion.
    pub async fn get(&self) -> Result<PooledConnection<'_, NntpConnectionManager>> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(NntpError::Other("connection pool is shut down".to_string()));
        }

        let mut last_error = None;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        for attempt in 0..=self.retry_config.max_retries {
            match self.pool.get().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    last_error = Some(e);

                    if attempt < self.retry_config.max_retries {
                        // Calculate backoff with optional jitter
                        let sleep_ms = if self.retry_config.jitter {
                            // Add 0-50% random jitter
                            let jitter = rand::thread_rng().gen_range(0..=(backoff_ms / 2));
                            backoff_ms + jitter
                        } else {
                            backoff_ms
                        };

                        warn!(
                            "Failed to get connection from pool (attempt {}/{}), retrying in {}ms: {}",
                            attempt + 1,
                            self.retry_config.max_retries + 1,
                            sleep_ms,
                            last_error.as_ref().unwrap()
                        );

                        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;

                        // Exponential backoff for next attempt
                        backoff_ms = std::cmp::min(
                            (backoff_ms as f64 * self.retry_config.backoff_multiplier) as u64,
                            self.retry_config.max_backoff_ms,
                        );
                    }
                }
            }
        }

        Err(NntpError::Other(format!(
            "Failed to get connection from pool after {} attempts: {}",
            self.retry_config.max_retries + 1,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Get a connection without retry (for cases where caller handles retry)
    ///
    /// # Errors
    ///
    /// Returns [`NntpError::Other`] if unable to get a connection from the pool.
    /// The underlying error may be a connection failure, authentication failure,
    /// or pool exhaustion.
    pub async fn get_no_retry(&self) -> Result<PooledConnection<'_, NntpConnectionManager>> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(NntpError::Other("connection pool is shut down".to_string()));
        }

        self.pool
            .get()
            .await
            .map_err(|e| NntpError::Other(format!("Failed to get connection from pool: {}", e)))
    }

    /// Get current pool state (for monitoring)
    ///
    /// Returns pool statistics including:
    /// - Number of connections in use
    /// - Number of idle connections
    /// - Total connections
    pub fn state(&self) -> bb8::State {
        self.pool.state()
    }

    /// Get the number of connections currently in use
    pub fn connections_in_use(&self) -> u32 {
        let state = self.pool.state();
        state.connections - state.idle_connections
    }

    /// Get the number of idle connections available
    pub fn idle_connections(&self) -> u32 {
        self.pool.state().idle_connections
    }
}
