//! SQLite implementation of the ConnectionRepository port.

use async_trait::async_trait;
use bergerie_common::TokenSet;
use bergerie_core::{ConnectionRepository, SyncOutcome};
use bergerie_domain::{BergerieError, Connection, Provider, Result, SyncState};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task::{self, JoinError};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::columns::parsed;
use super::manager::{checkout, map_join_error, DbPool};
use crate::errors::InfraError;

const SELECT_COLUMNS: &str = "SELECT id, establishment_id, provider, api_key, client_id,
        client_secret, access_token, refresh_token, token_expires_at, organization_slug,
        line_number, is_active, sync_status, sync_error, last_sync_at, sync_cursor,
        created_at, updated_at
     FROM provider_connections";

/// SQLite implementation of ConnectionRepository
pub struct SqliteConnectionRepository {
    pool: DbPool,
}

impl SqliteConnectionRepository {
    /// Construct a repository backed by the shared SQLite pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepository for SqliteConnectionRepository {
    #[instrument(skip(self))]
    async fn find(&self, establishment_id: Uuid, provider: Provider) -> Result<Option<Connection>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<Option<Connection>> {
            let conn = checkout(&pool)?;
            let sql = format!("{SELECT_COLUMNS} WHERE establishment_id = ?1 AND provider = ?2");
            let row = conn
                .query_row(
                    &sql,
                    params![establishment_id.to_string(), provider.as_str()],
                    map_connection_row,
                )
                .optional()
                .map_err(InfraError::from)?;
            Ok(row)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self))]
    async fn list_active(&self, provider: Provider) -> Result<Vec<Connection>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<Vec<Connection>> {
            let conn = checkout(&pool)?;
            let sql =
                format!("{SELECT_COLUMNS} WHERE provider = ?1 AND is_active = 1 ORDER BY id");
            let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
            let rows = stmt
                .query_map(params![provider.as_str()], map_connection_row)
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(rows)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self, connection), fields(connection_id = %connection.id))]
    async fn save(&self, connection: &Connection) -> Result<()> {
        let pool = self.pool.clone();
        let connection = connection.clone();
        let provider = connection.provider;

        task::spawn_blocking(move || -> Result<()> {
            let conn = checkout(&pool)?;
            conn.execute(
                "INSERT INTO provider_connections (
                    id, establishment_id, provider, api_key, client_id, client_secret,
                    access_token, refresh_token, token_expires_at, organization_slug,
                    line_number, is_active, sync_status, sync_error, last_sync_at, sync_cursor,
                    created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                           ?16, ?17, ?18)
                 ON CONFLICT(establishment_id, provider) DO UPDATE SET
                    api_key = excluded.api_key,
                    client_id = excluded.client_id,
                    client_secret = excluded.client_secret,
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    token_expires_at = excluded.token_expires_at,
                    organization_slug = excluded.organization_slug,
                    line_number = excluded.line_number,
                    is_active = excluded.is_active,
                    sync_status = excluded.sync_status,
                    sync_error = excluded.sync_error,
                    last_sync_at = excluded.last_sync_at,
                    sync_cursor = excluded.sync_cursor,
                    updated_at = excluded.updated_at",
                params![
                    connection.id.to_string(),
                    connection.establishment_id.to_string(),
                    connection.provider.as_str(),
                    connection.api_key,
                    connection.client_id,
                    connection.client_secret,
                    connection.access_token,
                    connection.refresh_token,
                    connection.token_expires_at,
                    connection.organization_slug,
                    connection.line_number,
                    connection.is_active,
                    connection.sync_status.as_str(),
                    connection.sync_error,
                    connection.last_sync_at,
                    connection.sync_cursor,
                    connection.created_at,
                    connection.updated_at,
                ],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
        .map_err(join_error)??;

        debug!(%provider, "connection saved");
        Ok(())
    }

    #[instrument(skip(self, tokens))]
    async fn update_tokens(
        &self,
        connection_id: Uuid,
        tokens: &TokenSet,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let pool = self.pool.clone();
        let tokens = tokens.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = checkout(&pool)?;
            let changed = conn
                .execute(
                    "UPDATE provider_connections
                     SET access_token = ?1, refresh_token = ?2, token_expires_at = ?3,
                         updated_at = ?4
                     WHERE id = ?5",
                    params![
                        tokens.access_token,
                        tokens.refresh_token,
                        tokens.expires_at,
                        at,
                        connection_id.to_string(),
                    ],
                )
                .map_err(InfraError::from)?;
            ensure_updated(changed, connection_id)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self))]
    async fn update_sync_state(
        &self,
        connection_id: Uuid,
        outcome: &SyncOutcome,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let pool = self.pool.clone();
        let outcome = outcome.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = checkout(&pool)?;
            let id = connection_id.to_string();
            let changed = match outcome {
                SyncOutcome::Started => conn.execute(
                    "UPDATE provider_connections SET sync_status = ?1, updated_at = ?2
                     WHERE id = ?3",
                    params![SyncState::Syncing.as_str(), at, id],
                ),
                SyncOutcome::Succeeded { cursor } => conn.execute(
                    "UPDATE provider_connections
                     SET sync_status = ?1, sync_error = NULL, last_sync_at = ?2,
                         sync_cursor = COALESCE(?3, sync_cursor), updated_at = ?2
                     WHERE id = ?4",
                    params![SyncState::Idle.as_str(), at, cursor, id],
                ),
                SyncOutcome::Failed { message } => conn.execute(
                    "UPDATE provider_connections
                     SET sync_status = ?1, sync_error = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![SyncState::Error.as_str(), message, at, id],
                ),
            }
            .map_err(InfraError::from)?;
            ensure_updated(changed, connection_id)
        })
        .await
        .map_err(join_error)?
    }

    #[instrument(skip(self))]
    async fn delete(&self, establishment_id: Uuid, provider: Provider) -> Result<bool> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = checkout(&pool)?;
            let removed = conn
                .execute(
                    "DELETE FROM provider_connections
                     WHERE establishment_id = ?1 AND provider = ?2",
                    params![establishment_id.to_string(), provider.as_str()],
                )
                .map_err(InfraError::from)?;
            Ok(removed > 0)
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(err: JoinError) -> BergerieError {
    map_join_error("connection repository", err)
}

fn ensure_updated(changed: usize, connection_id: Uuid) -> Result<()> {
    if changed == 0 {
        return Err(BergerieError::NotFound(format!("connection {connection_id}")));
    }
    Ok(())
}

fn map_connection_row(row: &Row<'_>) -> rusqlite::Result<Connection> {
    Ok(Connection {
        id: parsed(row, 0)?,
        establishment_id: parsed(row, 1)?,
        provider: parsed(row, 2)?,
        api_key: row.get(3)?,
        client_id: row.get(4)?,
        client_secret: row.get(5)?,
        access_token: row.get(6)?,
        refresh_token: row.get(7)?,
        token_expires_at: row.get(8)?,
        organization_slug: row.get(9)?,
        line_number: row.get(10)?,
        is_active: row.get(11)?,
        sync_status: parsed(row, 12)?,
        sync_error: row.get(13)?,
        last_sync_at: row.get(14)?,
        sync_cursor: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}
