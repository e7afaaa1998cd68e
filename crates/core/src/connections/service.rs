//! Connection lifecycle: connect, inspect, disconnect
//!
//! Credentials are checked against the provider before anything is stored,
//! so a saved connection is always one that worked at least once.

use std::sync::Arc;

use bergerie_common::{Clock, Pacer, TokenSet};
use bergerie_domain::{BergerieError, Connection, ConnectionStatus, Provider, Result};
use tracing::{info, instrument};
use uuid::Uuid;

use super::ports::ConnectionRepository;
use crate::auth::OAuthTokenClient;
use crate::calls::probe::probe_auth_scheme;
use crate::calls::CallProvider;
use crate::donations::{DonationProvider, OrganizationInfo};

/// Connects, inspects and removes provider connections.
pub struct ConnectionService {
    connections: Arc<dyn ConnectionRepository>,
    oauth_client: Arc<dyn OAuthTokenClient>,
    donation_provider: Arc<dyn DonationProvider>,
    call_provider: Arc<dyn CallProvider>,
    clock: Arc<dyn Clock>,
    probe_pacer: Arc<dyn Pacer>,
}

impl ConnectionService {
    /// Construct a service over the given repository and providers.
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        oauth_client: Arc<dyn OAuthTokenClient>,
        donation_provider: Arc<dyn DonationProvider>,
        call_provider: Arc<dyn CallProvider>,
        clock: Arc<dyn Clock>,
        probe_pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self { connections, oauth_client, donation_provider, call_provider, clock, probe_pacer }
    }

    /// Validate HelloAsso client credentials and the organisation, then
    /// store the connection with its first token set.
    ///
    /// Reconnecting replaces the stored credentials but keeps the sync
    /// history of the existing connection.
    #[instrument(skip(self, client_secret))]
    pub async fn connect_helloasso(
        &self,
        establishment_id: Uuid,
        client_id: &str,
        client_secret: &str,
        organization_slug: &str,
    ) -> Result<OrganizationInfo> {
        let client_id = required(client_id, "client id")?;
        let client_secret = required(client_secret, "client secret")?;
        let slug = required(organization_slug, "organization slug")?;

        let response = self.oauth_client.client_credentials(client_id, client_secret).await?;
        let now = self.clock.now();
        let tokens = TokenSet::from_response(response, now);
        let organization = self.donation_provider.organization(&tokens.access_token, slug).await?;

        let mut connection = self.existing_or_new(establishment_id, Provider::HelloAsso).await?;
        connection.client_id = Some(client_id.to_string());
        connection.client_secret = Some(client_secret.to_string());
        connection.organization_slug = Some(slug.to_string());
        connection.access_token = Some(tokens.access_token);
        connection.refresh_token = tokens.refresh_token;
        connection.token_expires_at = Some(tokens.expires_at);
        connection.is_active = true;
        connection.updated_at = now;
        self.connections.save(&connection).await?;

        info!(organization = %organization.name, "helloasso connected");
        Ok(organization)
    }

    /// Check the Ringover API key with the authorization probe, then store it
    /// with the reception line used for filtering.
    #[instrument(skip(self, api_key))]
    pub async fn connect_ringover(
        &self,
        establishment_id: Uuid,
        api_key: &str,
        line_number: Option<&str>,
    ) -> Result<ConnectionStatus> {
        let api_key = required(api_key, "api key")?;
        let auth =
            probe_auth_scheme(self.call_provider.as_ref(), api_key, self.probe_pacer.as_ref())
                .await?;

        let mut connection = self.existing_or_new(establishment_id, Provider::Ringover).await?;
        connection.api_key = Some(api_key.to_string());
        connection.line_number =
            line_number.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);
        connection.is_active = true;
        connection.updated_at = self.clock.now();
        self.connections.save(&connection).await?;

        info!(scheme = ?auth.scheme, "ringover connected");
        Ok(connection.status())
    }

    /// Remove a connection. Synced calls and donations are kept.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, establishment_id: Uuid, provider: Provider) -> Result<()> {
        if !self.connections.delete(establishment_id, provider).await? {
            return Err(BergerieError::NotFound(format!("no {provider} connection")));
        }
        info!("connection removed");
        Ok(())
    }

    /// Secret-free status, `None` when the provider was never connected.
    pub async fn connection_status(
        &self,
        establishment_id: Uuid,
        provider: Provider,
    ) -> Result<Option<ConnectionStatus>> {
        Ok(self.connections.find(establishment_id, provider).await?.map(|c| c.status()))
    }

    async fn existing_or_new(
        &self,
        establishment_id: Uuid,
        provider: Provider,
    ) -> Result<Connection> {
        Ok(self
            .connections
            .find(establishment_id, provider)
            .await?
            .unwrap_or_else(|| Connection::new(establishment_id, provider, self.clock.now())))
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BergerieError::InvalidInput(format!("{field} is required")));
    }
    Ok(value)
}
