//! Domain types and models

pub mod call;
pub mod connection;
pub mod donation;
pub mod summary;

pub use call::{CallDirection, CallRecord, CallStatus};
pub use connection::{Connection, ConnectionStatus, Provider, SyncState};
pub use donation::{amount_from_cents, Donation};
pub use summary::{CallSyncSummary, DonationImportSummary};
