//! # Bergerie Domain
//!
//! Business domain types for the provider integration layer.
//!
//! This crate contains:
//! - Provider connections and their sync bookkeeping
//! - Synced records (call log entries, donations) and run summaries
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants and phone-number helpers
//!
//! ## Architecture
//! - No dependencies on other Bergerie crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
