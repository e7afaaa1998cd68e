//! Provider connection commands
//!
//! Secrets travel inward only: responses carry the secret-free
//! [`ConnectionStatus`] or organisation metadata.

use bergerie_core::OrganizationInfo;
use bergerie_domain::ConnectionStatus;

use super::{parse_establishment_id, parse_provider};
use crate::context::AppContext;
use crate::utils::command_helpers::{execute_command, ActionResponse};

/// Validate HelloAsso credentials and store the connection.
pub async fn connect_helloasso(
    ctx: &AppContext,
    establishment_id: &str,
    client_id: &str,
    client_secret: &str,
    organization_slug: &str,
) -> ActionResponse<OrganizationInfo> {
    execute_command("connections::connect_helloasso", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        ctx.connections
            .connect_helloasso(establishment_id, client_id, client_secret, organization_slug)
            .await
    })
    .await
}

/// `line_number` restricts the sync to calls on that reception line.
pub async fn connect_ringover(
    ctx: &AppContext,
    establishment_id: &str,
    api_key: &str,
    line_number: Option<&str>,
) -> ActionResponse<ConnectionStatus> {
    execute_command("connections::connect_ringover", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        ctx.connections.connect_ringover(establishment_id, api_key, line_number).await
    })
    .await
}

/// Remove a provider connection; synced records are kept.
pub async fn disconnect_provider(
    ctx: &AppContext,
    establishment_id: &str,
    provider: &str,
) -> ActionResponse<()> {
    execute_command("connections::disconnect_provider", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        let provider = parse_provider(provider)?;
        ctx.connections.disconnect(establishment_id, provider).await
    })
    .await
}

/// `{ "data": null }` when the provider was never connected.
pub async fn get_connection_status(
    ctx: &AppContext,
    establishment_id: &str,
    provider: &str,
) -> ActionResponse<Option<ConnectionStatus>> {
    execute_command("connections::get_connection_status", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        let provider = parse_provider(provider)?;
        ctx.connections.connection_status(establishment_id, provider).await
    })
    .await
}
