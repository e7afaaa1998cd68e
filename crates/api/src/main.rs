//! Bergerie sync runner
//!
//! One-shot entry point for an external scheduler:
//!
//! ```text
//! bergerie-sync calls <establishment-id>
//! bergerie-sync donations <establishment-id>
//! bergerie-sync all
//! ```
//!
//! Each run prints one JSON response per establishment and exits non-zero
//! when any of them failed.

use std::process::ExitCode;

use anyhow::{bail, Context};
use bergerie_api::utils::logging::init_tracing;
use bergerie_api::{import_donations, sync_calls, ActionResponse, AppContext};
use bergerie_domain::Provider;
use serde::Serialize;

const USAGE: &str =
    "usage: bergerie-sync (calls <establishment-id> | donations <establishment-id> | all)";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env before tracing so RUST_LOG from the file applies
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let ctx = AppContext::new().await.context("failed to initialise application context")?;

    let failures = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["calls", establishment_id] => report(&sync_calls(&ctx, establishment_id).await)?,
        ["donations", establishment_id] => {
            report(&import_donations(&ctx, establishment_id).await)?
        }
        ["all"] => run_all(&ctx).await?,
        _ => bail!(USAGE),
    };

    Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Sync every active connection of both providers.
async fn run_all(ctx: &AppContext) -> anyhow::Result<usize> {
    let mut failures = 0;

    for connection in ctx.connection_repository.list_active(Provider::Ringover).await? {
        let id = connection.establishment_id.to_string();
        failures += report(&sync_calls(ctx, &id).await)?;
    }
    for connection in ctx.connection_repository.list_active(Provider::HelloAsso).await? {
        let id = connection.establishment_id.to_string();
        failures += report(&import_donations(ctx, &id).await)?;
    }

    Ok(failures)
}

/// Print the response as one JSON line; returns 1 for an error response.
fn report<T: Serialize>(response: &ActionResponse<T>) -> anyhow::Result<usize> {
    println!("{}", serde_json::to_string(response)?);
    Ok(usize::from(response.is_error()))
}
