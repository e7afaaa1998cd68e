//! Retry policy for provider requests
//!
//! Provider APIs here are rate limited, so only failures that say nothing
//! about the request itself are retried: transport errors and 5xx
//! responses. A 4xx (including 429) goes straight back to the caller, whose
//! pacer owns the request rate.

use std::time::Duration;

use reqwest::StatusCode;

/// How many times a request is sent and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Never below 1.
    pub attempts: usize,
    /// Wait before the first retry; doubles for each later one
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Construct a policy; `attempts` is raised to at least 1.
    pub fn new(attempts: usize, base_backoff: Duration) -> Self {
        Self { attempts: attempts.max(1), base_backoff }
    }

    /// Whether another try follows the 0-based `attempt`.
    pub fn has_attempt_after(&self, attempt: usize) -> bool {
        attempt + 1 < self.attempts
    }

    /// Exponential backoff before retry `retry` (1-based), capped at 2^8.
    pub fn delay_before(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1 << exponent)
    }

    /// Only 5xx responses are retried.
    pub fn retries_status(status: StatusCode) -> bool {
        status.is_server_error()
    }

    /// Transport failures that never produced a response.
    pub fn retries_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request()
    }
}
