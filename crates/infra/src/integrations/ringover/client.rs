//! Ringover HTTP client implementing the call provider port

use async_trait::async_trait;
use bergerie_core::{CallAuth, CallProvider, CallQuery};
use bergerie_domain::{BergerieError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::types::{unwrap_call_detail, CallListResponse};
use crate::http::{read_json, HttpClient};

/// Ringover public API client.
///
/// Every request carries the `Authorization` header chosen by the probe.
#[derive(Clone)]
pub struct RingoverClient {
    http: HttpClient,
    base_url: Url,
}

impl RingoverClient {
    /// Construct a client for the Ringover API rooted at `base_url`.
    pub fn new(http: HttpClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            BergerieError::Config(format!("invalid ringover base url {base_url}: {e}"))
        })?;
        Ok(Self { http, base_url })
    }

    /// `{base}/calls[/{call_id}]` with the call id escaped as one segment.
    fn calls_url(&self, call_id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                BergerieError::Config("ringover base url cannot carry a path".into())
            })?;
            segments.pop_if_empty().push("calls");
            if let Some(call_id) = call_id {
                segments.push(call_id);
            }
        }
        Ok(url)
    }
}

fn format_date(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl CallProvider for RingoverClient {
    #[instrument(skip(self, auth), fields(scheme = ?auth.scheme))]
    async fn probe(&self, auth: &CallAuth) -> Result<()> {
        let request = self
            .http
            .request(Method::GET, self.calls_url(None)?)
            .header(AUTHORIZATION, auth.header_value())
            .query(&[("limit_count", "1")]);
        self.http.send_checked(request).await?;
        Ok(())
    }

    #[instrument(skip(self, auth), fields(offset = query.offset, limit = query.limit))]
    async fn list_calls(&self, auth: &CallAuth, query: &CallQuery) -> Result<Vec<Value>> {
        let request = self
            .http
            .request(Method::GET, self.calls_url(None)?)
            .header(AUTHORIZATION, auth.header_value())
            .query(&[
                ("start_date", format_date(query.start)),
                ("end_date", format_date(query.end)),
                ("limit_count", query.limit.to_string()),
                ("limit_offset", query.offset.to_string()),
            ]);
        let response = self.http.send_checked(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let body: Option<CallListResponse> = read_json(response).await?;
        let calls = body.and_then(|b| b.call_list).unwrap_or_default();
        debug!(count = calls.len(), "received call page");
        Ok(calls)
    }

    #[instrument(skip(self, auth))]
    async fn get_call(&self, auth: &CallAuth, call_id: &str) -> Result<Option<Value>> {
        let request = self
            .http
            .request(Method::GET, self.calls_url(Some(call_id))?)
            .header(AUTHORIZATION, auth.header_value());
        let response = self.http.send(request).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BergerieError::provider(status.as_u16(), body));
        }

        let body: Option<Value> = read_json(response).await?;
        Ok(body.and_then(unwrap_call_detail))
    }
}
