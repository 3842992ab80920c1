//! Main-side transaction registry.
//!
//! Maps a [`TimerId`] to the transaction created when the timer was
//! scheduled: the user callback, its arguments, and its kind. The worker
//! side holds the matching native handle; the two stores are kept in
//! lockstep purely by message exchange.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use pulse_proto::{TimerId, TimerKind};

/// Callback stored in a transaction.
///
/// One-shot callbacks are consumed by their single invocation; repeating
/// callbacks are shared so they can be invoked without holding the
/// registry lock.
pub(crate) enum TimerCallback {
    /// Invoked at most once.
    Once(Box<dyn FnOnce(&[Value]) + Send>),
    /// Invoked on every fire until cancelled.
    Repeating(Arc<dyn Fn(&[Value]) + Send + Sync>),
}

/// The main-side record of an active scheduling request.
///
/// Created by `schedule`, removed when a one-shot fire is delivered, an
/// explicit cancel is issued, or a worker-originated clear arrives. Never
/// mutated in between.
pub(crate) struct Transaction {
    pub kind: TimerKind,
    pub callback: TimerCallback,
    pub duration: Duration,
    pub args: Vec<Value>,
}

#[derive(Default)]
pub(crate) struct TransactionRegistry {
    transactions: Mutex<HashMap<TimerId, Transaction>>,
}

impl TransactionRegistry {
    /// Store the transaction for a freshly allocated id.
    pub fn insert(&self, id: TimerId, transaction: Transaction) {
        trace!(
            %id,
            kind = ?transaction.kind,
            duration = ?transaction.duration,
            "transaction stored"
        );
        self.transactions.lock().insert(id, transaction);
    }

    /// Remove the transaction for `id`. Returns whether one was stored.
    pub fn remove(&self, id: TimerId) -> bool {
        self.transactions.lock().remove(&id).is_some()
    }

    /// Deliver a fire notification: invoke the callback for `id`.
    ///
    /// Returns `false` when the id is unknown (the message is dropped,
    /// covering the cancel-raced-with-fire case). The registry lock is
    /// never held across the invocation, so callbacks are free to schedule
    /// and cancel timers.
    pub fn invoke(&self, id: TimerId) -> bool {
        enum Deliver {
            Once(Box<dyn FnOnce(&[Value]) + Send>, Vec<Value>),
            Repeating(Arc<dyn Fn(&[Value]) + Send + Sync>, Vec<Value>),
        }

        let deliver = {
            let mut transactions = self.transactions.lock();
            let Some(kind) = transactions.get(&id).map(|t| t.kind) else {
                trace!(%id, "fire notification for unknown timer dropped");
                return false;
            };
            match kind {
                // A one-shot fire releases the transaction.
                TimerKind::OneShot => {
                    let Some(transaction) = transactions.remove(&id) else {
                        return false;
                    };
                    match transaction.callback {
                        TimerCallback::Once(callback) => Deliver::Once(callback, transaction.args),
                        TimerCallback::Repeating(callback) => {
                            Deliver::Repeating(callback, transaction.args)
                        }
                    }
                }
                TimerKind::Repeating => {
                    let Some(transaction) = transactions.get(&id) else {
                        return false;
                    };
                    match &transaction.callback {
                        TimerCallback::Repeating(callback) => {
                            Deliver::Repeating(callback.clone(), transaction.args.clone())
                        }
                        // Kind and callback shape are fixed together at
                        // schedule time; a mismatch cannot be stored.
                        TimerCallback::Once(_) => return false,
                    }
                }
            }
        };

        match deliver {
            Deliver::Once(callback, args) => callback(&args),
            Deliver::Repeating(callback, args) => callback(&args),
        }
        true
    }

    #[cfg(test)]
    pub fn contains(&self, id: TimerId) -> bool {
        self.transactions.lock().contains_key(&id)
    }
}
