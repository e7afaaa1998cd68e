//! Authorization scheme probe

use bergerie_common::{pause, Pacer};
use bergerie_domain::{BergerieError, Result};
use tracing::{debug, info, warn};

use super::ports::{AuthScheme, CallAuth, CallProvider};

/// Find the header format the provider accepts for `api_key`.
///
/// Schemes are tried in [`AuthScheme::PROBE_ORDER`] with a paced wait
/// between attempts; the first success wins. When every scheme fails the
/// last error (status and truncated body) is returned.
pub async fn probe_auth_scheme(
    provider: &dyn CallProvider,
    api_key: &str,
    pacer: &dyn Pacer,
) -> Result<CallAuth> {
    let mut last_error = None;

    for (attempt, scheme) in AuthScheme::PROBE_ORDER.into_iter().enumerate() {
        if attempt > 0 {
            pause(pacer, attempt as u32).await;
        }

        let candidate = CallAuth { api_key: api_key.to_string(), scheme };
        match provider.probe(&candidate).await {
            Ok(()) => {
                info!(scheme = ?scheme, "authorization scheme accepted");
                return Ok(candidate);
            }
            Err(err) => {
                debug!(scheme = ?scheme, error = %err, "authorization scheme rejected");
                last_error = Some(err);
            }
        }
    }

    warn!("no authorization scheme accepted by provider");
    Err(last_error
        .unwrap_or_else(|| BergerieError::Auth("no authorization scheme to probe".to_string())))
}
