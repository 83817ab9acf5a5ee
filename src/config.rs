//! NNTP server configuration

/// NNTP server configuration
///
/// Contains all the information needed to connect to an NNTP server.
///
/// # Example
///
/// ```
/// use usenet_engine::ServerConfig;
///
/// // Recommended: use the constructor methods
/// let config = ServerConfig::tls("news.example.com", "user", "pass");
///
/// // Or construct manually
/// let config = ServerConfig {
///     host: "news.example.com".to_string(),
///     port: 563,
///     tls: true,
///     allow_insecure_tls: false,
///     username: "user".to_string(),
///     password: "pass".to_string(),
///     command_timeout_ms: 15_000,
/// };
/// ```
#[must_use]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerConfig {
    /// Server hostname (e.g., "news.example.com")
    pub host: String,

    /// Server port (typically 119 for plain, 563 for TLS)
    pub port: u16,

    /// Use TLS/SSL encryption
    ///
    /// **Note:** Currently, TLS is always enabled when connecting to port 563.
    /// This field is maintained for configuration compatibility but does not
    /// affect runtime behavior. To use a plain unencrypted connection, use port 119
    /// (via `ServerConfig::plain()` or specify `port: 119` manually).
    ///
    /// In a future major version (0.2.0+), this may be replaced with a `TlsMode` enum
    /// to eliminate the separate `allow_insecure_tls` field and provide clearer semantics.
    #[serde(default = "default_tls")]
    pub tls: bool,

    /// Allow insecure TLS connections (self-signed certificates, expired certificates)
    ///
    /// **Security Warning:** Setting this to `true` disables certificate validation,
    /// making your connection vulnerable to man-in-the-middle attacks. Only use this
    /// for testing or with servers you trust on a secure network.
    ///
    /// When `true`:
    /// - Self-signed certificates are accepted
    /// - Expired certificates are accepted
    /// - Certificate hostname mismatches are accepted
    /// - Invalid certificate chains are accepted
    ///
    /// Default: `false` (secure certificate validation enabled)
    #[serde(default)]
    pub allow_insecure_tls: bool,

    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,

    /// Per-command timeout in milliseconds, applied fresh to every individual
    /// line/chunk read rather than once for a whole multi-line transfer, so
    /// it resets on every byte received instead of bounding large articles.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

fn default_tls() -> bool {
    true
}

fn default_command_timeout_ms() -> u64 {
    15_000
}

impl ServerConfig {
    /// Create a new server configuration
    ///
    /// # Arguments
    ///
    /// * `host` - Server hostname
    /// * `port` - Server port
    /// * `tls` - Whether to use TLS/SSL
    /// * `username` - Authentication username
    /// * `password` - Authentication password
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            allow_insecure_tls: false,
            username: username.into(),
            password: password.into(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }

    /// Create a configuration for a TLS connection on the standard secure port (563)
    pub fn tls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 563, true, username, password)
    }

    /// Create a configuration for a plain connection on the standard port (119)
    ///
    /// **Warning:** Plain connections transmit credentials in clear text.
    /// Use TLS connections whenever possible.
    pub fn plain(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 119, false, username, password)
    }

    /// Create a TLS configuration that accepts self-signed certificates
    ///
    /// **Security Warning:** This configuration disables certificate validation,
    /// making your connection vulnerable to man-in-the-middle attacks. Only use
    /// this for testing or with servers you trust on a secure network.
    ///
    /// # Example
    ///
    /// ```
    /// use usenet_engine::ServerConfig;
    ///
    /// // For a local NNTP server with a self-signed certificate
    /// let config = ServerConfig::tls_insecure("localhost", "user", "pass");
    /// ```
    pub fn tls_insecure(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let mut config = Self::tls(host, username, password);
        config.allow_insecure_tls = true;
        config
    }
}

/// A configured news server, including fallback and retry policy.
///
/// Immutable after construction of the pool that owns it; `fallback_provider_ids`
/// names other `Provider::id`s to try, in order, once this provider's own
/// `retry_attempts` are exhausted for a segment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Provider {
    /// Unique identifier, referenced by `fallback_provider_ids` of other providers.
    pub id: String,
    pub hostname: String,
    pub port: u16,
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Maximum simultaneous connections this provider's pool may open.
    pub max_connections: u32,
    /// Per-command timeout in milliseconds (resets on every byte received).
    #[serde(default = "default_article_timeout_ms")]
    pub article_timeout_ms: u64,
    /// Retries attempted against this provider before falling back.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base backoff in milliseconds; actual sleep is `retry_backoff_ms * 2^(attempt-1)`.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Ordered ids of providers to try once this one is exhausted.
    #[serde(default)]
    pub fallback_provider_ids: Vec<String>,
    /// Optional override of `EngineConfig::download_directory` for files from this provider.
    pub download_path: Option<std::path::PathBuf>,
}

fn default_article_timeout_ms() -> u64 {
    15_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1_000
}

impl Provider {
    /// Build a TLS provider with the crate's default timeouts and retry policy.
    pub fn tls(
        id: impl Into<String>,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        max_connections: u32,
    ) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            port: 563,
            use_ssl: true,
            username: Some(username.into()),
            password: Some(password.into()),
            max_connections,
            article_timeout_ms: default_article_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            fallback_provider_ids: Vec::new(),
            download_path: None,
        }
    }

    pub(crate) fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::new(
            self.hostname.clone(),
            self.port,
            self.use_ssl,
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        );
        config.command_timeout_ms = self.article_timeout_ms;
        config
    }
}

/// Per-provider bookkeeping maintained by the fallback policy.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ProviderStats {
    pub segments_downloaded: u64,
    pub fallback_usage_count: u64,
    /// Unix timestamp (seconds) of the last segment this provider served.
    pub last_used: Option<u64>,
}

/// Engine-wide settings shared by every job.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// When true, a CRC32 mismatch fails the segment instead of warn-and-accept.
    #[serde(default)]
    pub strict_crc: bool,
    /// Coalescing window for `DownloadEvent::Progress` re-emission, per job.
    #[serde(default = "default_status_poll_interval_ms")]
    pub status_poll_interval_ms: u64,
    pub download_directory: std::path::PathBuf,
}

fn default_status_poll_interval_ms() -> u64 {
    500
}

impl EngineConfig {
    pub fn new(download_directory: impl Into<std::path::PathBuf>) -> Self {
        Self {
            strict_crc: false,
            status_poll_interval_ms: default_status_poll_interval_ms(),
            download_directory: download_directory.into(),
        }
    }
}
