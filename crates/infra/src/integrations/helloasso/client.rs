//! HelloAsso HTTP client implementing the donation provider port

use async_trait::async_trait;
use bergerie_core::{DonationProvider, OrganizationInfo, Page, PaymentQuery};
use bergerie_domain::{BergerieError, Result};
use chrono::SecondsFormat;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::types::{OrganizationResponse, PaymentsResponse};
use crate::http::{read_json, HttpClient};

/// HelloAsso v5 API client. Requests are authenticated with the bearer token
/// handed in by the caller.
#[derive(Clone)]
pub struct HelloAssoClient {
    http: HttpClient,
    base_url: Url,
}

impl HelloAssoClient {
    /// Construct a client for the HelloAsso API rooted at `base_url`.
    pub fn new(http: HttpClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            BergerieError::Config(format!("invalid helloasso base url {base_url}: {e}"))
        })?;
        Ok(Self { http, base_url })
    }

    /// `{base}/v5/organizations/{slug}[/{tail}]` with the slug escaped.
    fn organization_url(&self, slug: &str, tail: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                BergerieError::Config("helloasso base url cannot carry a path".into())
            })?;
            segments.pop_if_empty().extend(["v5", "organizations", slug]);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl DonationProvider for HelloAssoClient {
    #[instrument(skip(self, access_token, query), fields(slug = %query.organization_slug))]
    async fn fetch_payments_page(
        &self,
        access_token: &str,
        query: &PaymentQuery,
        continuation_token: Option<&str>,
    ) -> Result<Page<Value>> {
        let url = self.organization_url(&query.organization_slug, Some("payments"))?;
        let mut params = vec![
            ("from", query.from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("to", query.to.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("pageSize", query.page_size.to_string()),
            ("states", query.state.clone()),
        ];
        if let Some(token) = continuation_token {
            params.push(("continuationToken", token.to_string()));
        }

        let request =
            self.http.request(Method::GET, url).bearer_auth(access_token).query(&params);
        let response = self.http.send_checked(request).await?;
        let body: PaymentsResponse = read_json(response).await?.unwrap_or_default();

        let next = body.pagination.and_then(|p| p.continuation_token).filter(|t| !t.is_empty());
        debug!(count = body.data.len(), has_next = next.is_some(), "received payments page");
        Ok(Page::new(body.data, next))
    }

    #[instrument(skip(self, access_token))]
    async fn organization(&self, access_token: &str, slug: &str) -> Result<OrganizationInfo> {
        let url = self.organization_url(slug, None)?;
        let request = self.http.request(Method::GET, url).bearer_auth(access_token);
        let response = self.http.send_checked(request).await?;
        let body: OrganizationResponse = read_json(response)
            .await?
            .ok_or_else(|| BergerieError::NotFound(format!("organization {slug}")))?;
        Ok(body.into_info(slug))
    }
}
