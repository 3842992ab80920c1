//! Context bootstrap.
//!
//! Stands up the worker execution context — an OS thread running the
//! worker dispatcher — and the channel pair connecting it to the
//! scheduling side. Construction tries a ranked list of spawn strategies
//! in order: a dedicated builder carrying the configured thread name and
//! stack size first, then a minimal builder with library defaults. The
//! first success wins; the last failure propagates.

use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use pulse_proto::{MainNotification, WorkerRequest};

use crate::config::WorkerTimerConfig;
use crate::error::{Result, TimerError};
use crate::worker;

/// Endpoints of a freshly spawned worker context.
///
/// The worker thread itself is detached: it exits when the request sender
/// is dropped or the shutdown flag is raised, and termination is not
/// graceful by design — nobody joins it.
pub(crate) struct WorkerContext {
    /// Outbound request channel into the worker.
    pub requests: Sender<WorkerRequest>,
    /// Inbound notification channel out of the worker.
    pub notifications: Receiver<MainNotification>,
    /// Raised by `terminate`; checked by both loops before processing.
    pub shutdown: Arc<AtomicBool>,
}

#[derive(Debug, Clone, Copy)]
enum SpawnStrategy {
    /// Named thread with the configured stack size.
    Dedicated,
    /// Builder with library defaults only, for hosts that reject the
    /// dedicated configuration.
    Minimal,
}

impl SpawnStrategy {
    fn label(self) -> &'static str {
        match self {
            SpawnStrategy::Dedicated => "dedicated",
            SpawnStrategy::Minimal => "minimal",
        }
    }

    fn spawn(
        self,
        config: &WorkerTimerConfig,
        entry: impl FnOnce() + Send + 'static,
    ) -> io::Result<()> {
        let builder = match self {
            SpawnStrategy::Dedicated => {
                let mut builder = thread::Builder::new().name(config.thread_name.clone());
                if let Some(stack_size) = config.stack_size {
                    builder = builder.stack_size(stack_size);
                }
                builder
            }
            SpawnStrategy::Minimal => thread::Builder::new(),
        };
        builder.spawn(entry).map(|_handle| ())
    }
}

/// Spawn the worker context for one timer instance.
pub(crate) fn spawn_worker_context(config: &WorkerTimerConfig) -> Result<WorkerContext> {
    let (request_tx, request_rx) = crossbeam_channel::unbounded();
    let (notification_tx, notification_rx) = crossbeam_channel::unbounded();
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut last_error = None;
    for strategy in [SpawnStrategy::Dedicated, SpawnStrategy::Minimal] {
        let requests = request_rx.clone();
        let notifications = notification_tx.clone();
        let flag = shutdown.clone();
        let entry = move || worker::run_dispatcher(requests, notifications, flag);

        match strategy.spawn(config, entry) {
            Ok(()) => {
                debug!(strategy = strategy.label(), "worker context spawned");
                return Ok(WorkerContext {
                    requests: request_tx,
                    notifications: notification_rx,
                    shutdown,
                });
            }
            Err(error) => {
                warn!(
                    strategy = strategy.label(),
                    %error,
                    "spawn strategy failed"
                );
                last_error = Some(error);
            }
        }
    }

    Err(TimerError::spawn(last_error.unwrap_or_else(|| {
        io::Error::other("no spawn strategy available")
    })))
}
