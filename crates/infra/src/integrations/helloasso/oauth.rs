//! HelloAsso token endpoint (`POST /oauth2/token`)

use async_trait::async_trait;
use bergerie_common::TokenResponse;
use bergerie_core::OAuthTokenClient;
use bergerie_domain::{BergerieError, Result};
use reqwest::Method;
use tracing::instrument;

use crate::http::{read_json, HttpClient};

/// Form-encoded OAuth 2.0 client for the HelloAsso token endpoint.
#[derive(Clone)]
pub struct HelloAssoOAuthClient {
    http: HttpClient,
    token_url: String,
}

impl HelloAssoOAuthClient {
    /// Construct a client posting to `{base_url}/oauth2/token`.
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self { http, token_url: format!("{}/oauth2/token", base_url.trim_end_matches('/')) }
    }

    async fn exchange(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let request = self.http.request(Method::POST, &self.token_url).form(form);
        let response = self.http.send_checked(request).await?;
        read_json(response)
            .await?
            .ok_or_else(|| BergerieError::Auth("token endpoint returned an empty body".into()))
    }
}

#[async_trait]
impl OAuthTokenClient for HelloAssoOAuthClient {
    #[instrument(skip_all)]
    async fn client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse> {
        self.exchange(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .await
    }

    #[instrument(skip_all)]
    async fn refresh_token(&self, client_id: &str, refresh_token: &str) -> Result<TokenResponse> {
        self.exchange(&[
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}
