//! Configuration for worker timer instances.

use std::time::Duration;

/// Minimum repeating duration. A zero-length interval would otherwise spin
/// the worker thread between fires.
pub(crate) const MIN_REPEATING_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for a [`WorkerTimer`](crate::WorkerTimer) instance.
///
/// The defaults are what the zero-setup constructor uses; most callers
/// never touch this.
#[derive(Debug, Clone)]
pub struct WorkerTimerConfig {
    /// Name given to the worker thread.
    /// Default: `"pulse-timer"`. The delivery thread is named after it
    /// with a `-delivery` suffix.
    pub thread_name: String,

    /// Stack size for the worker thread, when the platform default is not
    /// suitable. Default: `None` (platform default).
    pub stack_size: Option<usize>,

    /// Floor applied to repeating durations at schedule time.
    /// Default: 1ms.
    pub min_interval: Duration,
}

impl Default for WorkerTimerConfig {
    fn default() -> Self {
        Self {
            thread_name: "pulse-timer".to_string(),
            stack_size: None,
            min_interval: MIN_REPEATING_INTERVAL,
        }
    }
}

impl WorkerTimerConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the worker thread.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Request a specific worker thread stack size.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerTimerConfig::new();
        assert_eq!(config.thread_name, "pulse-timer");
        assert!(config.stack_size.is_none());
        assert_eq!(config.min_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_builder_style_overrides() {
        let config = WorkerTimerConfig::new()
            .with_thread_name("metronome")
            .with_stack_size(64 * 1024);
        assert_eq!(config.thread_name, "metronome");
        assert_eq!(config.stack_size, Some(64 * 1024));
    }
}
