//! NNTP authentication support (AUTHINFO USER/PASS and SASL)

use super::NntpClient;
use super::state::ConnectionState;
use crate::commands;
use crate::error::{NntpError, Result};
use crate::response::codes;
use tracing::debug;

impl NntpClient {
    /// Authenticate with username and password (AUTHINFO USER/PASS)
    ///
    /// Sends AUTHINFO USER followed by AUTHINFO PASS to authenticate
    /// with the server using credentials from the client configuration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use usenet_engine::{NntpClient, ServerConfig};
    /// # use std::sync::Arc;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ServerConfig::tls("news.example.com", "user", "pass");
    /// let mut client = NntpClient::connect(Arc::new(config)).await?;
    /// client.authenticate().await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::Protocol`] - Already authenticated
    /// - [`NntpError::AuthFailed`] - Invalid credentials
    /// - [`NntpError::ConnectionClosed`] - Server closed the connection
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn authenticate(&mut self) -> Result<()> {
        debug!("Authenticating as {}", self.config.username);

        // Check if already authenticated
        if matches!(self.state, ConnectionState::Authenticated) {
            return Err(NntpError::Protocol {
                code: 502,
                message: "Already authenticated".to_string(),
            });
        }

        // Send AUTHINFO USER
        let cmd = commands::authinfo_user(&self.config.username);
        self.send_command(&cmd).await?;

        // Mark authentication as in progress
        self.state = ConnectionState::InProgress;

        let response = self.read_response().await?;

        // Expect 381 (continue) or 281 (already authenticated)
        if response.code == codes::AUTH_CONTINUE {
            // Send AUTHINFO PASS
            let cmd = commands::authinfo_pass(&self.config.password);
            self.send_command(&cmd).await?;
            let response = self.read_response().await?;

            if response.code != codes::AUTH_ACCEPTED {
                // Reset to Ready state on failure
                self.state = ConnectionState::Ready;
                return Err(NntpError::AuthFailed(response.message));
            }
        } else if response.code != codes::AUTH_ACCEPTED {
            // Reset to Ready state on failure
            self.state = ConnectionState::Ready;
            return Err(NntpError::AuthFailed(response.message));
        }

        self.state = ConnectionState::Authenticated;
        debug!("Authentication successful");
        Ok(())
    }
}
