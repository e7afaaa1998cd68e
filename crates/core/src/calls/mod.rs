//! Telephony call log synchronisation

pub mod callbacks;
pub mod normalize;
pub mod ports;
pub mod probe;
pub mod service;

pub use callbacks::CallbackService;
pub use normalize::{extract_media_urls, normalize_call, MediaRef, NormalizeError, NormalizedCall};
pub use ports::{AuthScheme, CallAuth, CallProvider, CallQuery, CallRecordRepository};
pub use probe::probe_auth_scheme;
pub use service::{CallSyncService, CallSyncSettings};
