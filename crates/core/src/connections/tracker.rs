//! Sync status bookkeeping shared by every engine.
//!
//! A run moves its connection through `idle -> syncing -> {idle, error}`.
//! Engines wrap their work in [`SyncTracker::track`] so the transition is
//! written the same way whatever step fails.

use std::future::Future;
use std::sync::Arc;

use bergerie_common::Clock;
use bergerie_domain::Result;
use tracing::{info, warn};
use uuid::Uuid;

use super::ports::{ConnectionRepository, SyncOutcome};

/// Value produced by a successful run plus the cursor to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked<T> {
    pub value: T,
    /// New watermark; `None` leaves the stored cursor untouched
    pub cursor: Option<String>,
}

impl<T> Tracked<T> {
    pub const fn new(value: T, cursor: Option<String>) -> Self {
        Self { value, cursor }
    }

    pub const fn without_cursor(value: T) -> Self {
        Self { value, cursor: None }
    }
}

/// Writes sync checkpoints around a unit of work.
#[derive(Clone)]
pub struct SyncTracker {
    connections: Arc<dyn ConnectionRepository>,
    clock: Arc<dyn Clock>,
}

impl SyncTracker {
    /// Construct a tracker writing checkpoints through `connections`.
    pub fn new(connections: Arc<dyn ConnectionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { connections, clock }
    }

    /// Mark the connection `syncing`, await `work`, then mark it `idle`
    /// (with the returned cursor) or `error` (with the error message).
    ///
    /// The work's own error is returned even when recording the failure
    /// also fails; that secondary failure is only logged.
    pub async fn track<T, F>(&self, connection_id: Uuid, work: F) -> Result<T>
    where
        F: Future<Output = Result<Tracked<T>>> + Send,
        T: Send,
    {
        self.connections
            .update_sync_state(connection_id, &SyncOutcome::Started, self.clock.now())
            .await?;

        match work.await {
            Ok(Tracked { value, cursor }) => {
                self.connections
                    .update_sync_state(
                        connection_id,
                        &SyncOutcome::Succeeded { cursor },
                        self.clock.now(),
                    )
                    .await?;
                info!(connection_id = %connection_id, "sync run completed");
                Ok(value)
            }
            Err(err) => {
                let outcome = SyncOutcome::Failed { message: err.to_string() };
                if let Err(record_err) = self
                    .connections
                    .update_sync_state(connection_id, &outcome, self.clock.now())
                    .await
                {
                    warn!(
                        connection_id = %connection_id,
                        error = %record_err,
                        "failed to record sync failure"
                    );
                }
                warn!(connection_id = %connection_id, error = %err, "sync run failed");
                Err(err)
            }
        }
    }
}
