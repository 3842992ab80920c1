//! Activity counters for a worker timer instance.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing the activity of one instance.
///
/// Updated with relaxed atomics from the dispatching and delivery threads;
/// reads are snapshots, not a consistent view.
#[derive(Debug, Default)]
pub struct TimerStats {
    pub(crate) scheduled: AtomicU64,
    pub(crate) fired: AtomicU64,
    pub(crate) cancelled: AtomicU64,
}

impl TimerStats {
    /// Timers scheduled over the instance lifetime.
    pub fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }

    /// Callback invocations delivered.
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Cancellations that removed a stored transaction.
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }
}
