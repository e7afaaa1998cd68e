//! Call log commands: sync and call-back follow-up.

use bergerie_domain::{CallRecord, CallSyncSummary};

use super::parse_establishment_id;
use crate::context::AppContext;
use crate::utils::command_helpers::{execute_command, ActionResponse};

/// Pull new calls for an establishment from Ringover.
pub async fn sync_calls(
    ctx: &AppContext,
    establishment_id: &str,
) -> ActionResponse<CallSyncSummary> {
    execute_command("calls::sync_calls", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        ctx.call_sync.sync_calls(establishment_id).await
    })
    .await
}

/// Inbound calls still waiting for a call back, newest first.
pub async fn list_pending_callbacks(
    ctx: &AppContext,
    establishment_id: &str,
) -> ActionResponse<Vec<CallRecord>> {
    execute_command("calls::list_pending_callbacks", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        ctx.callbacks.pending_callbacks(establishment_id).await
    })
    .await
}

/// Record that a missed call was called back.
pub async fn mark_callback_handled(
    ctx: &AppContext,
    establishment_id: &str,
    provider_call_id: &str,
) -> ActionResponse<()> {
    execute_command("calls::mark_callback_handled", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        ctx.callbacks.mark_callback_handled(establishment_id, provider_call_id).await
    })
    .await
}
