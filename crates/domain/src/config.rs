//! Configuration structures
//!
//! Every section has working defaults, so a config file only needs the keys
//! it overrides.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE, DEFAULT_HTTP_BACKOFF_MS, DEFAULT_HTTP_MAX_ATTEMPTS,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PAGE_DELAY_MS, DEFAULT_PROBE_DELAY_MS,
    HELLOASSO_DEFAULT_BASE_URL, HELLOASSO_LOOKBACK_DAYS, HELLOASSO_PAGE_SIZE,
    RINGOVER_DEFAULT_BASE_URL, RINGOVER_LOOKBACK_DAYS, RINGOVER_MAX_RECORDS_PER_RUN,
    RINGOVER_PAGE_SIZE, TOKEN_REFRESH_MARGIN_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub ringover: RingoverConfig,
    pub helloasso: HelloAssoConfig,
    pub sync: SyncConfig,
}

/// SQLite storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Outbound HTTP client
///
/// `max_attempts` defaults to 1: provider errors surface to the caller
/// immediately and the next scheduled run retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS,
            base_backoff_ms: DEFAULT_HTTP_BACKOFF_MS,
        }
    }
}

/// Ringover call sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingoverConfig {
    pub base_url: String,
    /// Records requested per page (`limit_count`)
    pub page_size: u32,
    /// Scan cap per run. Calls past the cap that start before the new cursor
    /// are not revisited.
    pub max_records_per_run: u32,
    /// Window start for a connection without a cursor
    pub lookback_days: i64,
    /// Seconds subtracted from the cursor when opening the next window.
    /// Zero keeps the window start exactly at the last seen `start_time`.
    pub cursor_overlap_secs: i64,
}

impl Default for RingoverConfig {
    fn default() -> Self {
        Self {
            base_url: RINGOVER_DEFAULT_BASE_URL.to_string(),
            page_size: RINGOVER_PAGE_SIZE,
            max_records_per_run: RINGOVER_MAX_RECORDS_PER_RUN,
            lookback_days: RINGOVER_LOOKBACK_DAYS,
            cursor_overlap_secs: 0,
        }
    }
}

/// HelloAsso donation import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelloAssoConfig {
    pub base_url: String,
    pub page_size: u32,
    pub lookback_days: i64,
    /// Refresh the access token this many seconds before it expires
    pub token_refresh_margin_secs: i64,
}

impl Default for HelloAssoConfig {
    fn default() -> Self {
        Self {
            base_url: HELLOASSO_DEFAULT_BASE_URL.to_string(),
            page_size: HELLOASSO_PAGE_SIZE,
            lookback_days: HELLOASSO_LOOKBACK_DAYS,
            token_refresh_margin_secs: TOKEN_REFRESH_MARGIN_SECS,
        }
    }
}

/// Request pacing shared by both engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_delay_ms: u64,
    pub probe_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { page_delay_ms: DEFAULT_PAGE_DELAY_MS, probe_delay_ms: DEFAULT_PROBE_DELAY_MS }
    }
}
