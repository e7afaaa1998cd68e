use std::time::Duration;

use tracing::trace;

/// Strategy deciding how long to wait before a provider request.
///
/// `attempt` counts requests already issued in the current sequence
/// (page fetches, probe attempts), starting at 1 for the wait that precedes
/// the second request.
pub trait Pacer: Send + Sync {
    /// Delay to observe before issuing the next request.
    fn wait(&self, attempt: u32) -> Duration;
}

/// Same delay before every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    /// Fixed delay expressed in milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }
}

impl Pacer for FixedDelay {
    fn wait(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn wait(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Sleep for the delay the pacer assigns to `attempt`.
///
/// Zero delays return immediately without yielding to the runtime timer.
pub async fn pause(pacer: &dyn Pacer, attempt: u32) {
    let delay = pacer.wait(attempt);
    if delay.is_zero() {
        return;
    }
    trace!(attempt, delay_ms = delay.as_millis() as u64, "pacing provider request");
    tokio::time::sleep(delay).await;
}
