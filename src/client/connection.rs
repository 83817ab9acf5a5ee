//! Connection management for NNTP client
//!
//! This module handles TCP/TLS connection establishment, socket tuning,
//! and server greeting validation.

use crate::config::ServerConfig;
use crate::error::{NntpError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use super::NntpClient;
use super::state::ConnectionState;

/// TCP connection timeout in seconds
const TCP_CONNECT_TIMEOUT_SECS: u64 = 120;

/// TLS handshake timeout in seconds
const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 60;

/// BufReader capacity for high-throughput article downloads (256KB)
const BUFREADER_CAPACITY: usize = 256 * 1024;

/// Dangerous certificate verifier that accepts all certificates
///
/// **Security Warning:** This verifier disables all certificate validation,
/// making connections vulnerable to man-in-the-middle attacks. Only use this
/// for testing or with servers you trust on a secure network.
#[derive(Debug)]
pub(super) struct DangerousAcceptAnyCertificate;

impl ServerCertVerifier for DangerousAcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        // Accept any certificate without validation
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        // Accept any signature without validation
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        // Accept any signature without validation
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        // Support all signature schemes
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

impl NntpClient {
    /// Connect to NNTP server with TLS
    ///
    /// Establishes a secure connection to the NNTP server specified in the config.
    /// Does not authenticate - call [`authenticate`](Self::authenticate) after connecting.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::Io`] - TCP connection fails (DNS resolution, network unreachable, etc.)
    /// - [`NntpError::Tls`] - TLS handshake fails (invalid certificate, protocol error)
    /// - [`NntpError::Timeout`] - Connection or handshake times out
    /// - [`NntpError::Protocol`] - Server rejects the connection
    ///
    /// # Timeouts
    /// - TCP connection: `TCP_CONNECT_TIMEOUT_SECS` seconds
    /// - TLS handshake: `TLS_HANDSHAKE_TIMEOUT_SECS` seconds
    pub async fn connect(config: Arc<ServerConfig>) -> Result<Self> {
        debug!("Connecting to NNTP server {}:{}", config.host, config.port);

        // Create TCP connection with optimized socket buffers
        let addr = format!("{}:{}", config.host, config.port);

        // Parse the address to determine IP version
        use std::net::ToSocketAddrs;
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| {
                NntpError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Failed to resolve address: {}", e),
                ))
            })?
            .next()
            .ok_or_else(|| {
                NntpError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "No address resolved",
                ))
            })?;

        // Create socket using socket2 for buffer configuration
        use socket2::{Domain, Protocol, Socket, Type};
        let domain = if socket_addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket =
            Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(NntpError::Io)?;

        // Configure TCP socket for high-throughput downloads

        // Set TCP_NODELAY for low-latency request/response pattern
        socket.set_nodelay(true).map_err(NntpError::Io)?;

        // Set large receive buffer for high-bandwidth downloads (4MB)
        // This allows the OS to buffer more data, reducing the number of ACKs
        // and improving throughput on high-latency connections
        const RECV_BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB
        if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
            warn!(
                "Failed to set receive buffer size to {} bytes: {}",
                RECV_BUFFER_SIZE, e
            );
        } else {
            // Log the actual buffer size (OS may adjust)
            match socket.recv_buffer_size() {
                Ok(actual_size) => {
                    debug!(
                        "TCP receive buffer: requested {} bytes, actual {} bytes",
                        RECV_BUFFER_SIZE, actual_size
                    );
                }
                Err(e) => warn!("Failed to query receive buffer size: {}", e),
            }
        }

        // Set large send buffer for command pipelining (1MB)
        const SEND_BUFFER_SIZE: usize = 1024 * 1024; // 1MB
        if let Err(e) = socket.set_send_buffer_size(SEND_BUFFER_SIZE) {
            warn!(
                "Failed to set send buffer size to {} bytes: {}",
                SEND_BUFFER_SIZE, e
            );
        } else {
            // Log the actual buffer size (OS may adjust)
            match socket.send_buffer_size() {
                Ok(actual_size) => {
                    debug!(
                        "TCP send buffer: requested {} bytes, actual {} bytes",
                        SEND_BUFFER_SIZE, actual_size
                    );
                }
                Err(e) => warn!("Failed to query send buffer size: {}", e),
            }
        }

        // Connect with timeout (120 seconds for slow connections)
        // socket2::Socket::connect() is blocking, so we need to spawn it in a blocking task
        // NOTE: Connect BEFORE setting non-blocking mode
        let socket_addr_for_connect = socket_addr;
        let tcp_stream = timeout(
            Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
            tokio::task::spawn_blocking(move || -> std::io::Result<std::net::TcpStream> {
                // Connect while socket is still in blocking mode
                socket.connect(&socket_addr_for_connect.into())?;
                // Set non-blocking mode AFTER successful connect
                socket.set_nonblocking(true)?;
                Ok(socket.into())
            }),
        )
        .await
        .map_err(|_| NntpError::Timeout)?
        .map_err(|e| NntpError::Io(std::io::Error::other(format!("Task join error: {}", e))))?
        .map_err(NntpError::Io)?;

        // Convert to tokio TcpStream
        let tcp_stream = TcpStream::from_std(tcp_stream).map_err(NntpError::Io)?;

        // Set up TLS - install default crypto provider if not already installed
        use tokio_rustls::rustls::crypto::{CryptoProvider, ring};
        let _ = CryptoProvider::install_default(ring::default_provider());

        // Configure TLS based on security settings
        let tls_config = if config.allow_insecure_tls {
            // Insecure mode: accept any certificate (for self-signed certificates)
            warn!("TLS certificate validation disabled - connection vulnerable to MITM attacks");
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(DangerousAcceptAnyCertificate))
                .with_no_client_auth()
        } else {
            // Secure mode: validate certificates against trusted root CAs
            let mut root_store = RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth()
        };

        let connector = TlsConnector::from(Arc::new(tls_config));
        let server_name = ServerName::try_from(config.host.as_str())
            .map_err(|e| NntpError::Tls(format!("Invalid domain: {}", e)))?
            .to_owned();

        // TLS handshake with timeout (60 seconds)
        let tls_stream = timeout(
            Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
            connector.connect(server_name, tcp_stream),
        )
        .await
        .map_err(|_| NntpError::Timeout)?
        .map_err(|e| NntpError::Tls(format!("TLS handshake failed: {}", e)))?;

        // Use 256KB buffer for high-throughput article downloads
        // Default 8KB is too small and causes excessive syscalls
        let stream = BufReader::with_capacity(BUFREADER_CAPACITY, tls_stream);

        let mut client = Self {
            stream,
            state: ConnectionState::Ready,
            config,
            current_group: None,
            is_broken: false,
        };

        // Read server greeting
        let greeting = client.read_response().await?;
        debug!("Server greeting: {} {}", greeting.code, greeting.message);

        if !greeting.is_success() {
            return Err(NntpError::Protocol {
                code: greeting.code,
                message: greeting.message,
            });
        }

        Ok(client)
    }
}
