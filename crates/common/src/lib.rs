//! Common utilities shared across Bergerie crates.
//!
//! # Modules
//!
//! - [`time`]: wall-clock abstraction so expiry and window decisions can be
//!   driven by a mock clock in tests
//! - [`resilience`]: request pacing strategies used between provider calls
//! - [`auth`]: OAuth 2.0 token types
//! - `testing` (feature `test-utils`): deterministic test doubles

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod resilience;
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{TokenResponse, TokenSet};
pub use resilience::{pause, FixedDelay, NoDelay, Pacer};
pub use time::{Clock, SystemClock};
