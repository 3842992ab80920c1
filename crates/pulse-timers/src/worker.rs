//! Worker-side dispatcher.
//!
//! Runs on the worker thread and owns the only mapping from [`TimerId`] to
//! native wheel handle. Driven purely by inbound requests: schedules arm
//! the wheel with a callback that reports the fire, cancels disarm it.
//! The loop blocks on the request channel until the wheel's next deadline,
//! fires due timers between receives, and exits when the scheduling side
//! closes the channel or raises the shutdown flag.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info_span, trace};

use pulse_proto::{MainNotification, TimerId, TimerKind, WorkerRequest, wire};

use crate::wheel::{NativeHandle, TimerWheel};

pub(crate) fn run_dispatcher(
    requests: Receiver<WorkerRequest>,
    notifications: Sender<MainNotification>,
    shutdown: Arc<AtomicBool>,
) {
    let _span = info_span!("pulse_worker").entered();
    debug!("timer worker starting");

    let mut wheel = TimerWheel::new();
    let mut handles: HashMap<TimerId, NativeHandle> = HashMap::new();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            debug!("shutdown flag set");
            break;
        }

        // Sleep until the next deadline, or indefinitely when idle; a
        // disconnect wakes the thread either way.
        let received = match wheel.until_next_deadline(Instant::now()) {
            Some(wait) => requests.recv_timeout(wait),
            None => requests.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(request) => {
                if shutdown.load(Ordering::SeqCst) {
                    debug!("shutdown flag set, discarding in-flight request");
                    break;
                }
                handle_request(request, &mut wheel, &mut handles, &notifications);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("request channel disconnected");
                break;
            }
        }

        let completed = wheel.run_due(Instant::now());
        if !completed.is_empty() {
            handles.retain(|_, handle| !completed.contains(handle));
        }
    }

    debug!(armed = handles.len(), "timer worker stopped");
}

fn handle_request(
    request: WorkerRequest,
    wheel: &mut TimerWheel,
    handles: &mut HashMap<TimerId, NativeHandle>,
    notifications: &Sender<MainNotification>,
) {
    trace!(message = %wire::encode_request(&request), "request received");
    match request {
        WorkerRequest::Schedule { id, kind, duration } => {
            let report = notifications.clone();
            // Send failures mean the scheduling side is gone; the loop
            // exits on the accompanying disconnect.
            let handle = match kind {
                TimerKind::OneShot => wheel.schedule_once(
                    move || {
                        let _ = report.send(MainNotification::Fired { id });
                    },
                    duration,
                ),
                TimerKind::Repeating => wheel.schedule_repeating(
                    move || {
                        let _ = report.send(MainNotification::Fired { id });
                    },
                    duration,
                ),
            };
            handles.insert(id, handle);
        }
        WorkerRequest::Cancel { id, .. } => match handles.remove(&id) {
            Some(handle) => {
                wheel.cancel(handle);
            }
            // Already fired or never scheduled: treated as cancelled.
            None => trace!(%id, "cancel for unknown timer ignored"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn start() -> (
        Sender<WorkerRequest>,
        Receiver<MainNotification>,
        Arc<AtomicBool>,
    ) {
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (notification_tx, notification_rx) = crossbeam_channel::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        thread::spawn(move || run_dispatcher(request_rx, notification_tx, flag));
        (request_tx, notification_rx, shutdown)
    }

    #[test]
    fn test_one_shot_schedule_produces_a_single_fire() {
        let (requests, notifications, _shutdown) = start();
        requests
            .send(WorkerRequest::Schedule {
                id: TimerId(0),
                kind: TimerKind::OneShot,
                duration: Duration::from_millis(10),
            })
            .expect("worker running");

        let fired = notifications
            .recv_timeout(Duration::from_secs(2))
            .expect("fire notification");
        assert_eq!(fired, MainNotification::Fired { id: TimerId(0) });

        // No second fire for a one-shot.
        assert!(
            notifications
                .recv_timeout(Duration::from_millis(100))
                .is_err()
        );
    }

    #[test]
    fn test_repeating_schedule_keeps_firing_until_cancelled() {
        let (requests, notifications, _shutdown) = start();
        requests
            .send(WorkerRequest::Schedule {
                id: TimerId(0),
                kind: TimerKind::Repeating,
                duration: Duration::from_millis(10),
            })
            .expect("worker running");

        for _ in 0..3 {
            let fired = notifications
                .recv_timeout(Duration::from_secs(2))
                .expect("repeating fire");
            assert_eq!(fired, MainNotification::Fired { id: TimerId(0) });
        }

        requests
            .send(WorkerRequest::Cancel {
                id: TimerId(0),
                kind: TimerKind::Repeating,
            })
            .expect("worker running");

        // Drain anything in flight, then expect silence.
        while notifications
            .recv_timeout(Duration::from_millis(50))
            .is_ok()
        {}
        assert!(
            notifications
                .recv_timeout(Duration::from_millis(100))
                .is_err()
        );
    }

    #[test]
    fn test_cancel_before_deadline_suppresses_the_fire() {
        let (requests, notifications, _shutdown) = start();
        requests
            .send(WorkerRequest::Schedule {
                id: TimerId(0),
                kind: TimerKind::OneShot,
                duration: Duration::from_millis(200),
            })
            .expect("worker running");
        requests
            .send(WorkerRequest::Cancel {
                id: TimerId(0),
                kind: TimerKind::OneShot,
            })
            .expect("worker running");

        assert!(
            notifications
                .recv_timeout(Duration::from_millis(400))
                .is_err(),
            "cancelled timer must not fire"
        );
    }

    #[test]
    fn test_cancel_of_unknown_id_is_a_no_op() {
        let (requests, notifications, _shutdown) = start();
        requests
            .send(WorkerRequest::Cancel {
                id: TimerId(99),
                kind: TimerKind::OneShot,
            })
            .expect("worker running");

        // Worker stays healthy and serves the next schedule.
        requests
            .send(WorkerRequest::Schedule {
                id: TimerId(0),
                kind: TimerKind::OneShot,
                duration: Duration::ZERO,
            })
            .expect("worker running");
        assert!(
            notifications
                .recv_timeout(Duration::from_secs(2))
                .is_ok()
        );
    }

    #[test]
    fn test_worker_exits_when_the_request_channel_closes() {
        let (requests, notifications, _shutdown) = start();
        drop(requests);

        // Once the worker is gone its notification sender drops too.
        assert!(matches!(
            notifications.recv_timeout(Duration::from_secs(2)),
            Err(RecvTimeoutError::Disconnected)
        ));
    }
}
