//! Donation commands

use bergerie_domain::{Donation, DonationImportSummary};

use super::parse_establishment_id;
use crate::context::AppContext;
use crate::utils::command_helpers::{execute_command, ActionResponse};

/// Import new HelloAsso payments as donations with receipt numbers.
pub async fn import_donations(
    ctx: &AppContext,
    establishment_id: &str,
) -> ActionResponse<DonationImportSummary> {
    execute_command("donations::import_donations", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        ctx.donation_import.import_donations(establishment_id).await
    })
    .await
}

/// Stored donations, newest first.
pub async fn list_donations(
    ctx: &AppContext,
    establishment_id: &str,
) -> ActionResponse<Vec<Donation>> {
    execute_command("donations::list_donations", async {
        let establishment_id = parse_establishment_id(establishment_id)?;
        ctx.donation_import.list_donations(establishment_id).await
    })
    .await
}
