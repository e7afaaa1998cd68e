//! Results returned by sync runs.

use serde::{Deserialize, Serialize};

/// Outcome of one call sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSyncSummary {
    /// Records upserted (after line filtering)
    pub synced: usize,
    /// Records returned by the provider
    pub scanned: usize,
    /// Records dropped by the line filter
    pub filtered_out: usize,
    /// Provider records that could not be normalised
    pub skipped: usize,
    pub pages: u32,
    /// Cursor persisted at the end of the run
    pub cursor: Option<String>,
    /// `true` when the run stopped at the per-run scan cap
    pub capped: bool,
}

/// Outcome of one donation import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationImportSummary {
    /// Payments returned by the provider
    pub fetched: usize,
    /// New donations stored
    pub imported: usize,
    /// Payments already stored (or repeated within the fetch)
    pub skipped_existing: usize,
    /// New payments whose mapping or insert failed
    pub failed: usize,
}
