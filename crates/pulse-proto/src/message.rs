//! Message vocabulary crossing the context boundary.
//!
//! Four shapes, two per direction. The scheduling side only ever sends
//! [`WorkerRequest`]s; the worker side only ever sends
//! [`MainNotification`]s. Both sides consume [`TimerKind`] by exhaustive
//! match, never by name lookup.

use std::time::Duration;

use crate::id::TimerId;

/// Whether a timer fires once or keeps firing until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Fires once, then the timer is released on both sides.
    OneShot,
    /// Fires every `duration` until explicitly cancelled.
    Repeating,
}

/// Sent from the scheduling context to the worker context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest {
    /// Arm a native timer for `id`.
    Schedule {
        /// Id allocated by the scheduling side.
        id: TimerId,
        /// One-shot or repeating.
        kind: TimerKind,
        /// Delay before the first (and, for repeating timers, every) fire.
        duration: Duration,
    },
    /// Disarm the native timer for `id`, if it is still armed.
    Cancel {
        /// Id being cancelled.
        id: TimerId,
        /// Kind recorded at schedule time.
        kind: TimerKind,
    },
}

/// Sent from the worker context back to the scheduling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainNotification {
    /// The native timer for `id` fired; invoke its callback.
    Fired {
        /// Id whose timer fired.
        id: TimerId,
    },
    /// The worker released `id` without firing. Reserved for
    /// worker-initiated cleanup; the baseline worker never sends it.
    Cleared {
        /// Id that was released.
        id: TimerId,
    },
}
