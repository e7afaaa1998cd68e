//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Ringover call sync
pub const RINGOVER_DEFAULT_BASE_URL: &str = "https://public-api.ringover.com/v2";
pub const RINGOVER_PAGE_SIZE: u32 = 500;
pub const RINGOVER_MAX_RECORDS_PER_RUN: u32 = 9_000;
pub const RINGOVER_LOOKBACK_DAYS: i64 = 15;

// HelloAsso donation import
pub const HELLOASSO_DEFAULT_BASE_URL: &str = "https://api.helloasso.com";
pub const HELLOASSO_PAGE_SIZE: u32 = 100;
pub const HELLOASSO_LOOKBACK_DAYS: i64 = 3 * 365;
pub const HELLOASSO_PAYMENT_STATE: &str = "Authorized";
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

// Pacing between provider requests
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_PROBE_DELAY_MS: u64 = 1_000;

// Suffix length used to compare phone numbers across formats
pub const PHONE_MATCH_DIGITS: usize = 9;

// Provider response bodies are cut to this many characters in errors
pub const MAX_ERROR_BODY_CHARS: usize = 300;

pub const DONATION_SOURCE_HELLOASSO: &str = "helloasso";

// HTTP client defaults
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_MAX_ATTEMPTS: u32 = 1;
pub const DEFAULT_HTTP_BACKOFF_MS: u64 = 200;

// Database defaults
pub const DEFAULT_DB_PATH: &str = "bergerie.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
