//! Wall-clock abstraction.
//!
//! Token expiry checks and sync windows are computed against a [`Clock`]
//! rather than `Utc::now()` directly so tests can pin time with
//! `testing::MockClock`.
//!
//! ```rust
//! use bergerie_common::time::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let now = clock.now();
//! assert!(now.timestamp() > 0);
//! ```

pub mod clock;

pub use clock::{Clock, SystemClock};
