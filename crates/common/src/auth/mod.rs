//! OAuth 2.0 token types shared by provider integrations.
//!
//! Token acquisition itself (HTTP form posts against a provider's token
//! endpoint) lives in `bergerie-infra`; refresh decisions live in
//! `bergerie-core`. This module only carries the data that flows between
//! them.

pub mod types;

pub use types::{TokenResponse, TokenSet};
