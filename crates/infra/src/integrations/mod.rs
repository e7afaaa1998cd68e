//! External service integrations

pub mod helloasso;
pub mod ringover;

pub use helloasso::{HelloAssoClient, HelloAssoOAuthClient};
pub use ringover::RingoverClient;
