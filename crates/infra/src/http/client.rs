use std::time::Duration;

use bergerie_domain::constants::{
    DEFAULT_HTTP_BACKOFF_MS, DEFAULT_HTTP_MAX_ATTEMPTS, DEFAULT_HTTP_TIMEOUT_SECS,
};
use bergerie_domain::{BergerieError, HttpConfig};
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use crate::errors::InfraError;

/// Shared reqwest client for the provider integrations.
///
/// Cheap to clone; every clone shares one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Start from the built-in defaults.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with the built-in defaults: one attempt, 30s timeout.
    pub fn new() -> Result<Self, BergerieError> {
        Self::builder().build()
    }

    /// Client tuned by the `http` config section.
    pub fn from_config(config: &HttpConfig) -> Result<Self, BergerieError> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(config.max_attempts as usize)
            .base_backoff(Duration::from_millis(config.base_backoff_ms))
            .user_agent(concat!("bergerie/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    /// Request builder on the shared client; send it with [`send`](Self::send).
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder`, retrying transport failures and 5xx responses as the
    /// retry policy allows. Any other response is returned unchecked.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, BergerieError> {
        let mut attempt = 0;
        loop {
            let request = build_attempt(&builder)?;
            let method = request.method().clone();
            let path = request.url().path().to_string();
            let attempt_no = attempt + 1;
            let more = self.policy.has_attempt_after(attempt);

            match self.client.execute(request).await {
                Ok(response) if more && RetryPolicy::retries_status(response.status()) => {
                    let status = response.status();
                    warn!(attempt = attempt_no, %method, %path, %status, "retrying request");
                }
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt_no, %method, %path, %status, "response received");
                    return Ok(response);
                }
                Err(err) if more && RetryPolicy::retries_error(&err) => {
                    warn!(attempt = attempt_no, %method, %path, error = %err, "retrying request");
                }
                Err(err) => return Err(InfraError::from(err).into()),
            }

            attempt += 1;
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Like [`send`](Self::send), but a non-2xx response becomes
    /// `BergerieError::Provider` carrying the status and (truncated) body.
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response, BergerieError> {
        let response = self.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BergerieError::provider(status.as_u16(), body))
    }
}

fn build_attempt(builder: &RequestBuilder) -> Result<Request, BergerieError> {
    let cloned = builder.try_clone().ok_or_else(|| {
        BergerieError::Internal("streaming request bodies cannot be retried".into())
    })?;
    cloned.build().map_err(|err| InfraError::from(err).into())
}

/// Decode a JSON body; an empty body (204, or 200 with nothing) is `None`.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, BergerieError> {
    let body = response.text().await.map_err(InfraError::from)?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    let parsed = serde_json::from_str(&body).map_err(InfraError::from)?;
    Ok(Some(parsed))
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS as usize,
            base_backoff: Duration::from_millis(DEFAULT_HTTP_BACKOFF_MS),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts per request, first try included.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, BergerieError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(InfraError::from)?;
        Ok(HttpClient { client, policy: RetryPolicy::new(self.max_attempts, self.base_backoff) })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::{Method, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(attempts: usize) -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(attempts)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn default_client_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let http = HttpClient::new().expect("http client");
        let response = http.send(http.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        Mock::given(method("GET"))
            .respond_with(move |_: &wiremock::Request| {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    ResponseTemplate::new(502)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let http = client(3);
        let response = http.send(http.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rate_limit_is_returned_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&server)
            .await;

        let http = client(3);
        let err = http
            .send_checked(http.request(Method::GET, server.uri()))
            .await
            .expect_err("429 should fail");

        assert_eq!(err, BergerieError::provider(429, "slow down"));
    }

    #[tokio::test]
    async fn empty_body_reads_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(204)).mount(&server).await;

        let http = client(1);
        let response = http.send(http.request(Method::GET, server.uri())).await.expect("response");
        let body: Option<serde_json::Value> = read_json(response).await.expect("decoded");

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let http = client(2);
        let result = http.send(http.request(Method::GET, format!("http://{addr}"))).await;

        assert!(matches!(result, Err(BergerieError::Network(_))), "got {result:?}");
    }
}
