//! Callback follow-up on missed inbound calls

use std::sync::Arc;

use bergerie_common::Clock;
use bergerie_domain::{BergerieError, CallRecord, Result};
use tracing::{info, instrument};
use uuid::Uuid;

use super::ports::CallRecordRepository;

/// Call-back follow-up on stored calls.
pub struct CallbackService {
    calls: Arc<dyn CallRecordRepository>,
    clock: Arc<dyn Clock>,
}

impl CallbackService {
    /// Construct a service over the stored call log.
    pub fn new(calls: Arc<dyn CallRecordRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { calls, clock }
    }

    /// Calls still waiting for a call back, newest first.
    pub async fn pending_callbacks(&self, establishment_id: Uuid) -> Result<Vec<CallRecord>> {
        self.calls.pending_callbacks(establishment_id).await
    }

    /// Stamp a call as called back. Unknown calls are `NotFound`.
    #[instrument(skip(self))]
    pub async fn mark_callback_handled(
        &self,
        establishment_id: Uuid,
        provider_call_id: &str,
    ) -> Result<()> {
        let call_id = provider_call_id.trim();
        if call_id.is_empty() {
            return Err(BergerieError::InvalidInput("call id is required".to_string()));
        }

        let updated =
            self.calls.mark_callback_handled(establishment_id, call_id, self.clock.now()).await?;
        if !updated {
            return Err(BergerieError::NotFound(format!("call {call_id}")));
        }

        info!("callback marked as handled");
        Ok(())
    }
}
