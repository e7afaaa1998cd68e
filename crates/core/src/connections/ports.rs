//! Port interfaces for connection storage

use async_trait::async_trait;
use bergerie_common::TokenSet;
use bergerie_domain::{Connection, Provider, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Checkpoint written to a connection during a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Run started: `sync_status = syncing`
    Started,
    /// Run finished: `sync_status = idle`, error cleared, `last_sync_at`
    /// stamped. The cursor is replaced only when `Some`.
    Succeeded { cursor: Option<String> },
    /// Run failed: `sync_status = error`, message stored
    Failed { message: String },
}

/// Trait for connection persistence
///
/// At most one connection exists per (establishment, provider); `save`
/// creates or replaces it.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Connection for an establishment and provider, active or not
    async fn find(&self, establishment_id: Uuid, provider: Provider)
        -> Result<Option<Connection>>;

    /// All active connections for a provider
    async fn list_active(&self, provider: Provider) -> Result<Vec<Connection>>;

    /// Insert, or update the row for the same (establishment, provider)
    async fn save(&self, connection: &Connection) -> Result<()>;

    /// Persist a freshly obtained token set
    async fn update_tokens(
        &self,
        connection_id: Uuid,
        tokens: &TokenSet,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Record a sync checkpoint
    async fn update_sync_state(
        &self,
        connection_id: Uuid,
        outcome: &SyncOutcome,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Remove the connection; synced records are kept. Returns `false` when
    /// nothing was stored.
    async fn delete(&self, establishment_id: Uuid, provider: Provider) -> Result<bool>;
}
