//! # Bergerie Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for provider APIs and storage
//! - The OAuth token manager and the generic paginated fetcher
//! - The call-sync and donation-import engines
//! - Connection lifecycle and callback follow-up services
//!
//! ## Architecture Principles
//! - Only depends on `bergerie-common` and `bergerie-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Time and request pacing are injected so engines run deterministically
//!   in tests

pub mod auth;
pub mod calls;
pub mod connections;
pub mod donations;
pub mod pagination;

// Re-export specific items to avoid ambiguity
pub use auth::ports::OAuthTokenClient;
pub use auth::TokenManager;
pub use calls::ports::{AuthScheme, CallAuth, CallProvider, CallQuery, CallRecordRepository};
pub use calls::{CallSyncService, CallSyncSettings, CallbackService};
pub use connections::ports::{ConnectionRepository, SyncOutcome};
pub use connections::{ConnectionService, SyncTracker, Tracked};
pub use donations::ports::{
    DonationProvider, DonationRepository, OrganizationInfo, PaymentQuery, ReceiptNumberSequence,
};
pub use donations::{DonationImportService, DonationImportSettings};
pub use pagination::{collect_all_pages, Page, PageSource};
