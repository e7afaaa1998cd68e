//! # Bergerie Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite storage (connection pool, schema, repositories)
//! - The shared HTTP client and its error mapping
//! - Ringover and HelloAsso API clients
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `bergerie-core`
//! - Contains all "impure" code (network and disk I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use database::{
    DbManager, DbPool, SqliteCallRecordRepository, SqliteConnectionRepository,
    SqliteDonationRepository, SqliteReceiptSequence,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::{HelloAssoClient, HelloAssoOAuthClient, RingoverClient};
