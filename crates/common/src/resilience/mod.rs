//! Request pacing for rate-limited provider APIs.
//!
//! Provider clients never sleep on their own. Engines ask an injected
//! [`Pacer`] how long to wait before the next request and hand the result to
//! [`pause`]. Production wiring uses [`FixedDelay`]; tests use [`NoDelay`] or
//! `testing::RecordingPacer` so no wall-clock time passes.

pub mod pacing;

pub use pacing::{pause, FixedDelay, NoDelay, Pacer};
