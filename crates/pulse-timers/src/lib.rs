//! # Pulse Timers
//!
//! One-shot and repeating timers that fire from a dedicated worker
//! thread. Scheduling is shaped like the standard primitives —
//! `set_timeout`, `set_interval`, `clear_timeout`, `clear_interval` — but
//! callback delivery does not depend on the scheduling thread's event
//! turn, so timers keep firing while that thread is busy, blocked, or
//! otherwise throttled.
//!
//! Internally the crate is two registries connected by a message channel:
//! the scheduling side maps each [`TimerId`] to its callback, the worker
//! side maps the same id to a native timer. Neither side ever reads the
//! other's state; the [`pulse_proto`] messages are the only coupling.
//!
//! ## Instance API
//!
//! ```
//! use std::time::Duration;
//! use pulse_timers::WorkerTimer;
//!
//! let timers = WorkerTimer::new()?;
//! let id = timers.set_timeout(|| println!("late hello"), Duration::from_millis(20));
//! timers.clear_timeout(id); // never mind
//! timers.terminate();
//! # Ok::<(), pulse_timers::TimerError>(())
//! ```
//!
//! ## Module-level API
//!
//! The bare functions ([`set_timeout`], [`set_interval`], ...) operate on
//! a process-wide default instance created lazily on first use, for
//! drop-in use without any setup. [`terminate`] tears it down; the next
//! scheduling call creates a fresh one.

#![warn(clippy::all)]
#![warn(missing_docs)]

mod bootstrap;
pub mod config;
mod dispatcher;
pub mod error;
mod registry;
pub mod stats;
mod wheel;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use dispatcher::MainDispatcher;
use registry::TimerCallback;

pub use config::WorkerTimerConfig;
pub use error::{Result, TimerError};
pub use pulse_proto::{TimerId, TimerKind};
pub use serde_json::Value;
pub use stats::TimerStats;

/// One independent pair of scheduling registry and timer worker.
///
/// Every instance owns a worker thread (armed timers) and a delivery
/// thread (callback invocation); both exit on [`terminate`](Self::terminate)
/// or drop. Instances are fully isolated from each other — ids from one
/// mean nothing to another.
pub struct WorkerTimer {
    dispatcher: MainDispatcher,
}

impl WorkerTimer {
    /// Create an instance with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(WorkerTimerConfig::default())
    }

    /// Create an instance with explicit configuration.
    pub fn with_config(config: WorkerTimerConfig) -> Result<Self> {
        Ok(Self {
            dispatcher: MainDispatcher::new(&config)?,
        })
    }

    /// Schedule `callback` to run once after `delay`.
    ///
    /// Returns as soon as the request is on its way to the worker; the
    /// returned id can cancel the timer until its fire is delivered.
    pub fn set_timeout<F>(&self, callback: F, delay: Duration) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatcher.schedule(
            TimerKind::OneShot,
            TimerCallback::Once(Box::new(move |_args| callback())),
            delay,
            Vec::new(),
        )
    }

    /// Schedule `callback` to run once after `delay`, passing `args`.
    pub fn set_timeout_with_args<F>(
        &self,
        callback: F,
        delay: Duration,
        args: Vec<Value>,
    ) -> TimerId
    where
        F: FnOnce(&[Value]) + Send + 'static,
    {
        self.dispatcher.schedule(
            TimerKind::OneShot,
            TimerCallback::Once(Box::new(callback)),
            delay,
            args,
        )
    }

    /// Schedule `callback` to run every `every` until cleared.
    pub fn set_interval<F>(&self, callback: F, every: Duration) -> TimerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dispatcher.schedule(
            TimerKind::Repeating,
            TimerCallback::Repeating(Arc::new(move |_args| callback())),
            every,
            Vec::new(),
        )
    }

    /// Schedule `callback` to run every `every` until cleared, passing
    /// `args` on each fire.
    pub fn set_interval_with_args<F>(
        &self,
        callback: F,
        every: Duration,
        args: Vec<Value>,
    ) -> TimerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.dispatcher.schedule(
            TimerKind::Repeating,
            TimerCallback::Repeating(Arc::new(callback)),
            every,
            args,
        )
    }

    /// Cancel a one-shot timer. Unknown or already-fired ids are a no-op.
    pub fn clear_timeout(&self, id: TimerId) {
        self.dispatcher.cancel(TimerKind::OneShot, id);
    }

    /// Cancel a repeating timer. Unknown or already-cleared ids are a
    /// no-op.
    pub fn clear_interval(&self, id: TimerId) {
        self.dispatcher.cancel(TimerKind::Repeating, id);
    }

    /// Activity counters for this instance.
    pub fn stats(&self) -> Arc<TimerStats> {
        self.dispatcher.stats().clone()
    }

    /// Tear the instance down.
    ///
    /// Not graceful: timers still armed never fire, in-flight
    /// notifications are discarded, and no completion signal is produced.
    /// Callers that care about resource accounting should clear their
    /// timers first. Idempotent; also invoked on drop.
    pub fn terminate(&self) {
        self.dispatcher.terminate();
    }
}

impl Drop for WorkerTimer {
    fn drop(&mut self) {
        self.dispatcher.terminate();
    }
}

// ---------------------------------------------------------------------------
// Module-level default instance
// ---------------------------------------------------------------------------

/// The accessor below is the only mutable global state in the crate;
/// everything else is instance-scoped so the default can be swapped out.
static DEFAULT_INSTANCE: Mutex<Option<Arc<WorkerTimer>>> = Mutex::new(None);

fn default_instance() -> Result<Arc<WorkerTimer>> {
    let mut slot = DEFAULT_INSTANCE.lock();
    if let Some(instance) = slot.as_ref() {
        return Ok(instance.clone());
    }
    let instance = Arc::new(WorkerTimer::new()?);
    *slot = Some(instance.clone());
    Ok(instance)
}

/// Replace the process-wide default instance, returning the previous one.
///
/// Pass `None` to clear it; the next bare scheduling call recreates one
/// lazily. Intended for tests and hosts that want to inject a configured
/// instance.
pub fn replace_default(instance: Option<WorkerTimer>) -> Option<Arc<WorkerTimer>> {
    std::mem::replace(&mut *DEFAULT_INSTANCE.lock(), instance.map(Arc::new))
}

/// [`WorkerTimer::set_timeout`] on the default instance.
///
/// Errors only if the default instance had to be created and its worker
/// context could not be spawned.
pub fn set_timeout<F>(callback: F, delay: Duration) -> Result<TimerId>
where
    F: FnOnce() + Send + 'static,
{
    Ok(default_instance()?.set_timeout(callback, delay))
}

/// [`WorkerTimer::set_timeout_with_args`] on the default instance.
pub fn set_timeout_with_args<F>(callback: F, delay: Duration, args: Vec<Value>) -> Result<TimerId>
where
    F: FnOnce(&[Value]) + Send + 'static,
{
    Ok(default_instance()?.set_timeout_with_args(callback, delay, args))
}

/// [`WorkerTimer::set_interval`] on the default instance.
pub fn set_interval<F>(callback: F, every: Duration) -> Result<TimerId>
where
    F: Fn() + Send + Sync + 'static,
{
    Ok(default_instance()?.set_interval(callback, every))
}

/// [`WorkerTimer::set_interval_with_args`] on the default instance.
pub fn set_interval_with_args<F>(callback: F, every: Duration, args: Vec<Value>) -> Result<TimerId>
where
    F: Fn(&[Value]) + Send + Sync + 'static,
{
    Ok(default_instance()?.set_interval_with_args(callback, every, args))
}

/// [`WorkerTimer::clear_timeout`] on the default instance. A no-op when
/// no default instance exists.
pub fn clear_timeout(id: TimerId) {
    if let Some(instance) = DEFAULT_INSTANCE.lock().as_ref() {
        instance.clear_timeout(id);
    }
}

/// [`WorkerTimer::clear_interval`] on the default instance. A no-op when
/// no default instance exists.
pub fn clear_interval(id: TimerId) {
    if let Some(instance) = DEFAULT_INSTANCE.lock().as_ref() {
        instance.clear_interval(id);
    }
}

/// Terminate and discard the default instance, if one exists.
///
/// The next bare scheduling call creates a fresh instance with fresh ids.
pub fn terminate() {
    if let Some(instance) = DEFAULT_INSTANCE.lock().take() {
        instance.terminate();
    }
}
