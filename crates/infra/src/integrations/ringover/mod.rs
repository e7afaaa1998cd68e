//! Ringover telephony API

pub mod client;
pub mod types;

pub use client::RingoverClient;
