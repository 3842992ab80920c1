//! Main-side dispatcher.
//!
//! Translates public scheduling calls into outbound requests and drives
//! the delivery loop that turns inbound notifications into callback
//! invocations and registry updates. The delivery loop runs on its own
//! thread, so callbacks keep firing while the thread that scheduled them
//! is busy or blocked.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info_span, trace, warn};

use pulse_proto::{MainNotification, TimerId, TimerIdAllocator, TimerKind, WorkerRequest, wire};

use crate::bootstrap;
use crate::config::WorkerTimerConfig;
use crate::error::{Result, TimerError};
use crate::registry::{TimerCallback, Transaction, TransactionRegistry};
use crate::stats::TimerStats;

pub(crate) struct MainDispatcher {
    allocator: TimerIdAllocator,
    registry: Arc<TransactionRegistry>,
    stats: Arc<TimerStats>,
    /// Taken (and thereby closed) on terminate.
    requests: Mutex<Option<Sender<WorkerRequest>>>,
    shutdown: Arc<AtomicBool>,
    min_interval: Duration,
}

impl MainDispatcher {
    pub fn new(config: &WorkerTimerConfig) -> Result<Self> {
        let context = bootstrap::spawn_worker_context(config)?;
        let registry = Arc::new(TransactionRegistry::default());
        let stats = Arc::new(TimerStats::default());

        let delivery = {
            let notifications = context.notifications.clone();
            let registry = registry.clone();
            let stats = stats.clone();
            let shutdown = context.shutdown.clone();
            thread::Builder::new()
                .name(format!("{}-delivery", config.thread_name))
                .spawn(move || run_delivery(notifications, registry, stats, shutdown))
        };
        if let Err(error) = delivery {
            // Without a delivery loop the instance is useless; tear the
            // worker context down again before reporting.
            context.shutdown.store(true, Ordering::SeqCst);
            drop(context);
            return Err(TimerError::spawn(error));
        }

        Ok(Self {
            allocator: TimerIdAllocator::new(),
            registry,
            stats,
            requests: Mutex::new(Some(context.requests)),
            shutdown: context.shutdown,
            min_interval: config.min_interval,
        })
    }

    /// Allocate an id, store the transaction, and request a native timer.
    ///
    /// Returns as soon as the request is enqueued; the timer is armed on
    /// the worker side asynchronously.
    pub fn schedule(
        &self,
        kind: TimerKind,
        callback: TimerCallback,
        duration: Duration,
        args: Vec<Value>,
    ) -> TimerId {
        let id = self.allocator.next();
        if self.shutdown.load(Ordering::SeqCst) {
            warn!(%id, "schedule on a terminated instance does nothing");
            return id;
        }

        let duration = match kind {
            TimerKind::OneShot => duration,
            // A zero-length interval would spin the worker.
            TimerKind::Repeating => duration.max(self.min_interval),
        };

        self.registry.insert(
            id,
            Transaction {
                kind,
                callback,
                duration,
                args,
            },
        );
        self.send(WorkerRequest::Schedule { id, kind, duration });
        self.stats.scheduled.fetch_add(1, Ordering::Relaxed);
        id
    }

    /// Request cancellation and drop the stored transaction.
    ///
    /// Unknown and already-fired ids are a no-op.
    pub fn cancel(&self, kind: TimerKind, id: TimerId) {
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }
        self.send(WorkerRequest::Cancel { id, kind });
        if self.registry.remove(id) {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> &Arc<TimerStats> {
        &self.stats
    }

    /// Tear the instance down. Not graceful: in-flight notifications are
    /// discarded, remaining transactions become unreachable, and no
    /// completion signal is produced. Idempotent.
    pub fn terminate(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("terminating worker timer instance");
        // Closing the request channel wakes the worker; its exit closes
        // the notification channel, which stops the delivery loop.
        let _ = self.requests.lock().take();
    }

    fn send(&self, request: WorkerRequest) {
        trace!(message = %wire::encode_request(&request), "sending");
        match self.requests.lock().as_ref() {
            Some(requests) => {
                if requests.send(request).is_err() {
                    warn!("worker context is gone, request dropped");
                }
            }
            None => warn!("request after terminate dropped"),
        }
    }
}

fn run_delivery(
    notifications: Receiver<MainNotification>,
    registry: Arc<TransactionRegistry>,
    stats: Arc<TimerStats>,
    shutdown: Arc<AtomicBool>,
) {
    let _span = info_span!("pulse_delivery").entered();
    debug!("delivery loop starting");

    while let Ok(notification) = notifications.recv() {
        if shutdown.load(Ordering::SeqCst) {
            debug!("shutdown flag set, discarding in-flight notification");
            break;
        }
        trace!(message = %wire::encode_notification(&notification), "delivering");
        match notification {
            // Callback panics are deliberately not caught here: they
            // unwind this thread the same way an uncaught exception
            // reaches the host's top-level error handler.
            MainNotification::Fired { id } => {
                if registry.invoke(id) {
                    stats.fired.fetch_add(1, Ordering::Relaxed);
                }
            }
            MainNotification::Cleared { id } => {
                registry.remove(id);
            }
        }
    }

    debug!("delivery loop stopped");
}
