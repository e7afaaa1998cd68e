//! Provider connections
//!
//! A connection holds one establishment's credentials and sync bookkeeping
//! for one provider. There is at most one per (establishment, provider).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// External provider a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ringover,
    HelloAsso,
}

impl_domain_status_conversions!(Provider {
    Ringover => "ringover",
    HelloAsso => "helloasso",
});

/// Sync state machine: `idle -> syncing -> {idle, error}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Error,
}

impl_domain_status_conversions!(SyncState {
    Idle => "idle",
    Syncing => "syncing",
    Error => "error",
});

/// Stored credentials, tokens and sync bookkeeping.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub provider: Provider,

    /// Ringover API key
    pub api_key: Option<String>,
    /// HelloAsso OAuth client id
    pub client_id: Option<String>,
    /// HelloAsso OAuth client secret
    pub client_secret: Option<String>,

    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,

    /// HelloAsso organisation the payments belong to
    pub organization_slug: Option<String>,
    /// Ringover reception line; calls on other lines are filtered out
    pub line_number: Option<String>,

    pub is_active: bool,
    pub sync_status: SyncState,
    pub sync_error: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Provider specific watermark (RFC 3339 timestamp for calls)
    pub sync_cursor: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    /// Fresh, active connection with no credentials set.
    pub fn new(establishment_id: Uuid, provider: Provider, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            establishment_id,
            provider,
            api_key: None,
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            token_expires_at: None,
            organization_slug: None,
            line_number: None,
            is_active: true,
            sync_status: SyncState::Idle,
            sync_error: None,
            last_sync_at: None,
            sync_cursor: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Secret-free view for status queries.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            provider: self.provider,
            connected: self.is_active,
            sync_status: self.sync_status,
            sync_error: self.sync_error.clone(),
            last_sync_at: self.last_sync_at,
            sync_cursor: self.sync_cursor.clone(),
            organization_slug: self.organization_slug.clone(),
            line_number: self.line_number.clone(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("establishment_id", &self.establishment_id)
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("token_expires_at", &self.token_expires_at)
            .field("organization_slug", &self.organization_slug)
            .field("line_number", &self.line_number)
            .field("is_active", &self.is_active)
            .field("sync_status", &self.sync_status)
            .field("sync_error", &self.sync_error)
            .field("last_sync_at", &self.last_sync_at)
            .field("sync_cursor", &self.sync_cursor)
            .finish_non_exhaustive()
    }
}

/// Connection state exposed to callers (no secrets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub provider: Provider,
    pub connected: bool,
    pub sync_status: SyncState,
    pub sync_error: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub sync_cursor: Option<String>,
    pub organization_slug: Option<String>,
    pub line_number: Option<String>,
}
