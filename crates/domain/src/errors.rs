//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::MAX_ERROR_BODY_CHARS;
use crate::utils::text::truncate_chars;

/// Main error type for Bergerie
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BergerieError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-success HTTP response from a provider API.
    #[error("Provider error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BergerieError {
    /// Provider error with the response body truncated for storage and logs.
    pub fn provider(status: u16, body: impl AsRef<str>) -> Self {
        Self::Provider { status, body: truncate_chars(body.as_ref(), MAX_ERROR_BODY_CHARS) }
    }

    /// HTTP status carried by a provider error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for credential rejections (401/403 or auth failures).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth(_)) || matches!(self.status(), Some(401 | 403))
    }
}

/// Result type alias for Bergerie operations
pub type Result<T> = std::result::Result<T, BergerieError>;
