//! # Bergerie API
//!
//! Application layer - action commands and the sync runner.
//!
//! This crate contains:
//! - Action commands returning the uniform `{ data } | { error }` shape
//! - Application context (dependency injection)
//! - Tracing initialisation
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the ports of `core` to the adapters of `infra`

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
pub use utils::command_helpers::ActionResponse;
