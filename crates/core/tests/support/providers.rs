//! Scripted provider ports that record what the engines ask for

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bergerie_common::TokenResponse;
use bergerie_core::{
    AuthScheme, CallAuth, CallProvider, CallQuery, DonationProvider, OAuthTokenClient,
    OrganizationInfo, Page, PaymentQuery,
};
use bergerie_domain::{BergerieError, Result as DomainResult};
use parking_lot::Mutex;
use serde_json::Value;

/// Telephony provider serving a fixed call list by offset.
#[derive(Default, Clone)]
pub struct ScriptedCallProvider {
    accepted_scheme: Option<AuthScheme>,
    calls: Arc<Vec<Value>>,
    details: Arc<HashMap<String, Value>>,
    failing_details: bool,
    probes: Arc<Mutex<Vec<AuthScheme>>>,
    queries: Arc<Mutex<Vec<CallQuery>>>,
    detail_requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCallProvider {
    pub fn accepting(scheme: AuthScheme) -> Self {
        Self { accepted_scheme: Some(scheme), ..Self::default() }
    }

    /// Provider that rejects every authorization scheme.
    pub fn rejecting() -> Self {
        Self::default()
    }

    pub fn with_calls(mut self, calls: Vec<Value>) -> Self {
        self.calls = Arc::new(calls);
        self
    }

    pub fn with_detail(mut self, call_id: &str, detail: Value) -> Self {
        Arc::make_mut(&mut self.details).insert(call_id.to_string(), detail);
        self
    }

    pub fn with_failing_details(mut self) -> Self {
        self.failing_details = true;
        self
    }

    pub fn probes(&self) -> Vec<AuthScheme> {
        self.probes.lock().clone()
    }

    pub fn queries(&self) -> Vec<CallQuery> {
        self.queries.lock().clone()
    }

    pub fn detail_requests(&self) -> Vec<String> {
        self.detail_requests.lock().clone()
    }

    fn check(&self, auth: &CallAuth) -> DomainResult<()> {
        if self.accepted_scheme == Some(auth.scheme) {
            Ok(())
        } else {
            Err(BergerieError::provider(401, r#"{"message":"invalid api key"}"#))
        }
    }
}

#[async_trait]
impl CallProvider for ScriptedCallProvider {
    async fn probe(&self, auth: &CallAuth) -> DomainResult<()> {
        self.probes.lock().push(auth.scheme);
        self.check(auth)
    }

    async fn list_calls(&self, auth: &CallAuth, query: &CallQuery) -> DomainResult<Vec<Value>> {
        self.check(auth)?;
        self.queries.lock().push(*query);
        Ok(self
            .calls
            .iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_call(&self, auth: &CallAuth, call_id: &str) -> DomainResult<Option<Value>> {
        self.check(auth)?;
        self.detail_requests.lock().push(call_id.to_string());
        if self.failing_details {
            return Err(BergerieError::provider(500, "upstream timeout"));
        }
        Ok(self.details.get(call_id).cloned())
    }
}

/// Fundraising provider replaying a queue of payment pages.
#[derive(Default, Clone)]
pub struct ScriptedDonationProvider {
    pages: Arc<Mutex<VecDeque<DomainResult<Page<Value>>>>>,
    organization: Option<OrganizationInfo>,
    tokens_seen: Arc<Mutex<Vec<String>>>,
    continuation_tokens: Arc<Mutex<Vec<Option<String>>>>,
    queries: Arc<Mutex<Vec<PaymentQuery>>>,
}

impl ScriptedDonationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, items: Vec<Value>, continuation_token: Option<&str>) -> Self {
        self.pages
            .lock()
            .push_back(Ok(Page::new(items, continuation_token.map(str::to_string))));
        self
    }

    pub fn with_failure(self, error: BergerieError) -> Self {
        self.pages.lock().push_back(Err(error));
        self
    }

    pub fn with_organization(mut self, name: &str, slug: &str) -> Self {
        self.organization =
            Some(OrganizationInfo { name: name.to_string(), slug: slug.to_string() });
        self
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().clone()
    }

    pub fn continuation_tokens(&self) -> Vec<Option<String>> {
        self.continuation_tokens.lock().clone()
    }

    pub fn queries(&self) -> Vec<PaymentQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl DonationProvider for ScriptedDonationProvider {
    async fn fetch_payments_page(
        &self,
        access_token: &str,
        query: &PaymentQuery,
        continuation_token: Option<&str>,
    ) -> DomainResult<Page<Value>> {
        self.tokens_seen.lock().push(access_token.to_string());
        self.continuation_tokens.lock().push(continuation_token.map(str::to_string));
        self.queries.lock().push(query.clone());
        self.pages.lock().pop_front().unwrap_or_else(|| Ok(Page::new(Vec::new(), None)))
    }

    async fn organization(
        &self,
        _access_token: &str,
        slug: &str,
    ) -> DomainResult<OrganizationInfo> {
        self.organization
            .clone()
            .filter(|org| org.slug == slug)
            .ok_or_else(|| BergerieError::provider(404, "organization not found"))
    }
}

/// Token endpoint issuing numbered access tokens.
#[derive(Default, Clone)]
pub struct StaticOAuthClient {
    issued: Arc<AtomicUsize>,
    reject: bool,
}

impl StaticOAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self { reject: true, ..Self::default() }
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    fn issue(&self) -> DomainResult<TokenResponse> {
        if self.reject {
            return Err(BergerieError::provider(401, r#"{"error":"invalid_client"}"#));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TokenResponse {
            access_token: format!("access-{n}"),
            refresh_token: Some(format!("refresh-{n}")),
            token_type: Some("bearer".to_string()),
            expires_in: 1800,
        })
    }
}

#[async_trait]
impl OAuthTokenClient for StaticOAuthClient {
    async fn client_credentials(
        &self,
        _client_id: &str,
        _client_secret: &str,
    ) -> DomainResult<TokenResponse> {
        self.issue()
    }

    async fn refresh_token(
        &self,
        _client_id: &str,
        _refresh_token: &str,
    ) -> DomainResult<TokenResponse> {
        self.issue()
    }
}
