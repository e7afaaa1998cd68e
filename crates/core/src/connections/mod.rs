//! Provider connection lifecycle and sync bookkeeping

pub mod ports;
pub mod service;
pub mod tracker;

pub use ports::{ConnectionRepository, SyncOutcome};
pub use service::ConnectionService;
pub use tracker::{SyncTracker, Tracked};
