//! Timer identifiers and their allocator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque identifier correlating a scheduling request with its eventual
/// fire and clear notifications.
///
/// Ids are unique within one allocator's lifetime and never reused. They
/// carry no meaning across instances or restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Produces a strictly increasing, gap-free stream of [`TimerId`]s.
///
/// One allocator belongs to exactly one dispatcher; the dispatcher is the
/// only caller of [`next`](Self::next). Exhaustion of the u64 range is not
/// a practical concern and is not handled.
#[derive(Debug, Default)]
pub struct TimerIdAllocator {
    next: AtomicU64,
}

impl TimerIdAllocator {
    /// Create an allocator whose first id is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn next(&self) -> TimerId {
        TimerId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
