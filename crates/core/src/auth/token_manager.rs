//! Token manager with automatic refresh
//!
//! Hands out a usable access token for a connection:
//! - Reuses the stored token while it is outside the refresh margin
//! - Refreshes with the stored refresh token when one exists
//! - Falls back to a full client-credentials exchange when refresh fails or
//!   no refresh token is stored
//! - Persists the new token set before returning it

use std::sync::Arc;

use bergerie_common::{Clock, TokenResponse, TokenSet};
use bergerie_domain::{BergerieError, Connection, Result};
use tracing::{debug, info, instrument, warn};

use super::ports::OAuthTokenClient;
use crate::connections::ports::ConnectionRepository;

/// Hands out a valid HelloAsso access token, refreshing it when close to expiry.
pub struct TokenManager {
    oauth_client: Arc<dyn OAuthTokenClient>,
    connections: Arc<dyn ConnectionRepository>,
    clock: Arc<dyn Clock>,
    refresh_margin_seconds: i64,
}

impl TokenManager {
    /// `refresh_margin_seconds` is how long before expiry a token is renewed.
    pub fn new(
        oauth_client: Arc<dyn OAuthTokenClient>,
        connections: Arc<dyn ConnectionRepository>,
        clock: Arc<dyn Clock>,
        refresh_margin_seconds: i64,
    ) -> Self {
        Self { oauth_client, connections, clock, refresh_margin_seconds }
    }

    /// `true` when no token is stored, the expiry is unknown, or
    /// `now >= expires_at - margin`.
    pub fn needs_refresh(&self, connection: &Connection) -> bool {
        match (&connection.access_token, connection.token_expires_at) {
            (Some(_), Some(expires_at)) => {
                self.clock.now() + chrono::Duration::seconds(self.refresh_margin_seconds)
                    >= expires_at
            }
            _ => true,
        }
    }

    /// Return a valid access token, refreshing and persisting when needed.
    ///
    /// `connection` is updated in place with the new token fields so the
    /// caller keeps working on a current copy.
    ///
    /// # Errors
    /// - `BergerieError::Auth` when the connection has no client credentials
    /// - `BergerieError::Provider` with the token endpoint's status and body
    /// - Any repository error raised while persisting the token set
    #[instrument(skip(self, connection), fields(connection_id = %connection.id))]
    pub async fn get_valid_access_token(&self, connection: &mut Connection) -> Result<String> {
        if !self.needs_refresh(connection) {
            if let Some(token) = &connection.access_token {
                debug!("reusing stored access token");
                return Ok(token.clone());
            }
        }

        let response = self.obtain_tokens(connection).await?;
        let now = self.clock.now();
        let mut tokens = TokenSet::from_response(response, now);
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = connection.refresh_token.clone();
        }

        self.connections.update_tokens(connection.id, &tokens, now).await?;

        connection.access_token = Some(tokens.access_token.clone());
        connection.refresh_token = tokens.refresh_token.clone();
        connection.token_expires_at = Some(tokens.expires_at);
        connection.updated_at = now;

        info!(expires_in = tokens.expires_in, "access token renewed");
        Ok(tokens.access_token)
    }

    async fn obtain_tokens(&self, connection: &Connection) -> Result<TokenResponse> {
        let client_id = connection
            .client_id
            .as_deref()
            .ok_or_else(|| BergerieError::Auth("connection has no client id".to_string()))?;

        if let Some(refresh_token) = connection.refresh_token.as_deref() {
            match self.oauth_client.refresh_token(client_id, refresh_token).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    warn!(error = %err, "refresh token rejected, re-authenticating");
                }
            }
        }

        let client_secret = connection
            .client_secret
            .as_deref()
            .ok_or_else(|| BergerieError::Auth("connection has no client secret".to_string()))?;

        self.oauth_client.client_credentials(client_id, client_secret).await
    }
}
