//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when `BERGERIE_DB_PATH` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise [`Config::default`]
//!
//! Every section has defaults, so both the environment and a file only need
//! to carry the values they change.
//!
//! ## Environment Variables
//! - `BERGERIE_DB_PATH`: Database file path (selects environment loading)
//! - `BERGERIE_DB_POOL_SIZE`: Connection pool size
//! - `BERGERIE_HTTP_TIMEOUT_SECS`: Outbound request timeout
//! - `BERGERIE_HTTP_MAX_ATTEMPTS`: Attempts per request (1 = no retry)
//! - `BERGERIE_RINGOVER_BASE_URL`: Telephony API base URL
//! - `BERGERIE_RINGOVER_CURSOR_OVERLAP_SECS`: Lag applied to the next window
//! - `BERGERIE_HELLOASSO_BASE_URL`: Fundraising API base URL
//! - `BERGERIE_SYNC_PAGE_DELAY_MS`: Pause between provider pages
//! - `BERGERIE_SYNC_PROBE_DELAY_MS`: Pause between authorization probes
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` and `./bergerie.{json,toml}`
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bergerie_domain::{BergerieError, Config, Result};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `BergerieError::Config` if a present source is invalid. Missing
/// sources are not an error.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            return Ok(config);
        }
        Err(e) => tracing::debug!(error = %e, "environment configuration unavailable"),
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("no configuration found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `BERGERIE_DB_PATH` is required; every other variable overrides its
/// default only when set.
///
/// # Errors
/// Returns `BergerieError::Config` if `BERGERIE_DB_PATH` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.database.path = env_var("BERGERIE_DB_PATH")?;

    if let Some(size) = env_parse::<u32>("BERGERIE_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }
    if let Some(secs) = env_parse::<u64>("BERGERIE_HTTP_TIMEOUT_SECS")? {
        config.http.timeout_secs = secs;
    }
    if let Some(attempts) = env_parse::<u32>("BERGERIE_HTTP_MAX_ATTEMPTS")? {
        config.http.max_attempts = attempts;
    }
    if let Ok(url) = std::env::var("BERGERIE_RINGOVER_BASE_URL") {
        config.ringover.base_url = url;
    }
    if let Some(secs) = env_parse::<i64>("BERGERIE_RINGOVER_CURSOR_OVERLAP_SECS")? {
        config.ringover.cursor_overlap_secs = secs;
    }
    if let Ok(url) = std::env::var("BERGERIE_HELLOASSO_BASE_URL") {
        config.helloasso.base_url = url;
    }
    if let Some(ms) = env_parse::<u64>("BERGERIE_SYNC_PAGE_DELAY_MS")? {
        config.sync.page_delay_ms = ms;
    }
    if let Some(ms) = env_parse::<u64>("BERGERIE_SYNC_PROBE_DELAY_MS")? {
        config.sync.probe_delay_ms = ms;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// detected by file extension.
///
/// # Errors
/// Returns `BergerieError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BergerieError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BergerieError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BergerieError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BergerieError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BergerieError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BergerieError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("bergerie.json"),
        dir.join("bergerie.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| BergerieError::Config(format!("Missing required environment variable: {key}")))
}

/// `Ok(None)` when unset, `Config` error when set but unparseable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| BergerieError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
