//! Port interfaces for OAuth token endpoints

use async_trait::async_trait;
use bergerie_common::TokenResponse;
use bergerie_domain::Result;

/// Trait for an OAuth 2.0 token endpoint
///
/// Implementations perform exactly one HTTP exchange per call. Non-success
/// responses surface as `BergerieError::Provider` with the status and body.
#[async_trait]
pub trait OAuthTokenClient: Send + Sync {
    /// `grant_type=client_credentials`
    async fn client_credentials(&self, client_id: &str, client_secret: &str)
        -> Result<TokenResponse>;

    /// `grant_type=refresh_token`
    async fn refresh_token(&self, client_id: &str, refresh_token: &str) -> Result<TokenResponse>;
}
