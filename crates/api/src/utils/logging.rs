//! Tracing setup and structured command logging.

use std::time::Duration;

use bergerie_domain::BergerieError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` (default `info`). Setting
/// `BERGERIE_LOG_FORMAT=json` switches to one JSON object per line. Calling
/// this twice is harmless; the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("BERGERIE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(
    command: &str,
    elapsed: Duration,
    error: Option<&BergerieError>,
) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => warn!(
            command,
            duration_ms,
            error_type = error_label(err),
            error = %err,
            "command_execution_failure"
        ),
    }
}

/// Convert a `BergerieError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &BergerieError) -> &'static str {
    match error {
        BergerieError::Database(_) => "database",
        BergerieError::Config(_) => "config",
        BergerieError::Network(_) => "network",
        BergerieError::Auth(_) => "auth",
        BergerieError::Provider { .. } => "provider",
        BergerieError::NotFound(_) => "not_found",
        BergerieError::InvalidInput(_) => "invalid_input",
        BergerieError::Internal(_) => "internal",
    }
}
