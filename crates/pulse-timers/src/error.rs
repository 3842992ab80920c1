//! Error types for pulse-timers.

use thiserror::Error;

/// Errors that can occur while standing up a worker timer instance.
///
/// Running instances do not surface errors: cancelling an unknown id is a
/// no-op, notifications for unknown ids are dropped, and callback panics
/// are deliberately not intercepted.
#[derive(Error, Debug)]
pub enum TimerError {
    /// Every spawn strategy failed to produce a worker context.
    #[error("failed to spawn timer worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl TimerError {
    /// Create a spawn error from the last strategy's failure.
    pub fn spawn(error: std::io::Error) -> Self {
        Self::Spawn(error)
    }
}

/// Result type alias for worker timer operations.
pub type Result<T> = std::result::Result<T, TimerError>;
