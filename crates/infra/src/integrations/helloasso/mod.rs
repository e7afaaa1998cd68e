//! HelloAsso fundraising API

pub mod client;
pub mod oauth;
pub mod types;

pub use client::HelloAssoClient;
pub use oauth::HelloAssoOAuthClient;
