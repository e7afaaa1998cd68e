use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::resilience::Pacer;

/// Pacer that records every `wait` call and returns a zero delay.
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    calls: Arc<Mutex<Vec<u32>>>,
}

impl RecordingPacer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt numbers passed to `wait`, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Pacer for RecordingPacer {
    fn wait(&self, attempt: u32) -> Duration {
        self.calls.lock().push(attempt);
        Duration::ZERO
    }
}
