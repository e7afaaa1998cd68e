//! Port interfaces for the telephony provider and the call log

use std::fmt;

use async_trait::async_trait;
use bergerie_domain::{CallRecord, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Authorization header format accepted by the telephony API.
///
/// Accounts differ in whether the API key must be sent bare or as a bearer
/// token; the probe determines which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: <key>`
    Raw,
    /// `Authorization: Bearer <key>`
    Bearer,
}

impl AuthScheme {
    /// Order in which schemes are probed.
    pub const PROBE_ORDER: [Self; 2] = [Self::Raw, Self::Bearer];

    /// Header value for `api_key` under this scheme.
    pub fn header_value(self, api_key: &str) -> String {
        match self {
            Self::Raw => api_key.to_string(),
            Self::Bearer => format!("Bearer {api_key}"),
        }
    }
}

/// API key plus the scheme the probe selected for it.
#[derive(Clone, PartialEq, Eq)]
pub struct CallAuth {
    pub api_key: String,
    pub scheme: AuthScheme,
}

impl CallAuth {
    pub fn header_value(&self) -> String {
        self.scheme.header_value(&self.api_key)
    }
}

impl fmt::Debug for CallAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallAuth")
            .field("api_key", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// One offset page of the call list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: u32,
    pub offset: u32,
}

/// Trait for the telephony provider API
///
/// Call payloads are returned as raw JSON; the engine normalises them.
#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Lightweight authenticated request used to validate a scheme.
    async fn probe(&self, auth: &CallAuth) -> Result<()>;

    /// One page of calls started within the query window
    async fn list_calls(&self, auth: &CallAuth, query: &CallQuery)
        -> Result<Vec<serde_json::Value>>;

    /// Single call detail, `None` when the provider does not know the id
    async fn get_call(&self, auth: &CallAuth, call_id: &str)
        -> Result<Option<serde_json::Value>>;
}

/// Trait for call log persistence
#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// Insert or update by (establishment, provider call id). The callback
    /// handled timestamp of an existing row is preserved.
    async fn upsert_batch(&self, records: &[CallRecord]) -> Result<usize>;

    /// Inbound calls awaiting a call back, newest first
    async fn pending_callbacks(&self, establishment_id: Uuid) -> Result<Vec<CallRecord>>;

    /// Stamp a call as called back. Returns `false` for an unknown call.
    async fn mark_callback_handled(
        &self,
        establishment_id: Uuid,
        provider_call_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Number of stored calls for an establishment
    async fn count(&self, establishment_id: Uuid) -> Result<usize>;
}
