//! Shared HTTP plumbing for provider clients

pub mod client;
pub mod retry;

pub use client::{read_json, HttpClient, HttpClientBuilder};
pub use retry::RetryPolicy;
