//! Testing utilities and helpers
//!
//! - **[`time`]**: a settable wall clock
//! - **[`pacing`]**: a pacer that records requested waits and never sleeps
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use bergerie_common::testing::{MockClock, RecordingPacer};
//! use bergerie_common::{Clock, Pacer};
//!
//! let clock = MockClock::at_timestamp(1_700_000_000);
//! clock.advance_secs(60);
//! assert_eq!(clock.now().timestamp(), 1_700_000_060);
//!
//! let pacer = RecordingPacer::new();
//! pacer.wait(1);
//! assert_eq!(pacer.calls(), vec![1]);
//! # }
//! ```

pub mod pacing;
pub mod time;

pub use pacing::RecordingPacer;
pub use time::MockClock;
