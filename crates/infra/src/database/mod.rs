//! SQLite storage: pool management and the repository implementations.

mod columns;

pub mod call_record_repository;
pub mod connection_repository;
pub mod donation_repository;
pub mod manager;
pub mod receipt_sequence;

pub use call_record_repository::SqliteCallRecordRepository;
pub use connection_repository::SqliteConnectionRepository;
pub use donation_repository::SqliteDonationRepository;
pub use manager::{DbConnection, DbManager, DbPool};
pub use receipt_sequence::SqliteReceiptSequence;
