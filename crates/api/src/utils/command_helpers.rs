//! Command execution helpers
//!
//! Every command runs through [`execute_command`], which times it, logs the
//! outcome and folds the domain result into an [`ActionResponse`].

use std::future::Future;
use std::time::Instant;

use bergerie_domain::Result as DomainResult;
use serde::{Deserialize, Serialize};

use crate::utils::logging::log_command_execution;

/// Uniform command result: `{ "data": … }` on success, `{ "error": "…" }`
/// on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResponse<T> {
    Data { data: T },
    Error { error: String },
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::Data { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { error: message.into() }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Data { data } => Some(data),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Data { .. } => None,
            Self::Error { error } => Some(error),
        }
    }
}

impl<T> From<DomainResult<T>> for ActionResponse<T> {
    fn from(result: DomainResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::error(err.to_string()),
        }
    }
}

/// Run a command body with timing and structured logging.
pub async fn execute_command<Fut, T>(command_name: &str, command: Fut) -> ActionResponse<T>
where
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command.await;
    log_command_execution(command_name, start.elapsed(), result.as_ref().err());
    result.into()
}
