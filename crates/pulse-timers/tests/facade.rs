//! The module-level API over the lazily-created default instance.
//!
//! These tests share one piece of process-global state, so they serialize
//! themselves on a local mutex instead of trusting the harness ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pulse_timers::{TimerId, WorkerTimer, WorkerTimerConfig};

static GLOBAL_INSTANCE_LOCK: Mutex<()> = Mutex::new(());

fn wait_for(deadline: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_bare_functions_share_one_lazy_instance() {
    let _serial = GLOBAL_INSTANCE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    pulse_timers::terminate(); // start from a clean slate

    let count = Arc::new(AtomicUsize::new(0));
    let bump = {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    };

    let first = pulse_timers::set_timeout(bump, Duration::ZERO).expect("lazy instance");
    assert_eq!(first, TimerId(0), "first use creates a fresh instance");
    assert!(wait_for(Duration::from_secs(2), || {
        count.load(Ordering::SeqCst) == 1
    }));

    // Same instance: the allocator keeps counting.
    let second = pulse_timers::set_interval(|| {}, Duration::from_millis(50)).expect("instance");
    assert_eq!(second, TimerId(1));
    pulse_timers::clear_interval(second);

    // Terminating the default discards it; the next call starts over.
    pulse_timers::terminate();
    let fresh = pulse_timers::set_timeout(|| {}, Duration::from_secs(60)).expect("new instance");
    assert_eq!(fresh, TimerId(0));
    pulse_timers::terminate();
}

#[test]
fn test_clears_without_an_instance_are_no_ops() {
    let _serial = GLOBAL_INSTANCE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    pulse_timers::terminate();

    // No default exists; these must neither create one nor panic.
    pulse_timers::clear_timeout(TimerId(0));
    pulse_timers::clear_interval(TimerId(3));
}

#[test]
fn test_replace_default_injects_a_configured_instance() {
    let _serial = GLOBAL_INSTANCE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    pulse_timers::terminate();

    let injected = WorkerTimer::with_config(
        WorkerTimerConfig::new().with_thread_name("facade-test-timer"),
    )
    .expect("bootstrap");
    let stats = injected.stats();
    let previous = pulse_timers::replace_default(Some(injected));
    assert!(previous.is_none());

    let count = Arc::new(AtomicUsize::new(0));
    let bump = {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    };
    pulse_timers::set_timeout(bump, Duration::ZERO).expect("injected instance");

    assert!(wait_for(Duration::from_secs(2), || {
        count.load(Ordering::SeqCst) == 1
    }));
    assert_eq!(stats.fired(), 1, "the injected instance served the call");

    pulse_timers::terminate();
}
