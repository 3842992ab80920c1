//! Worker-side native scheduler: a monotonic-clock timer wheel.
//!
//! The wheel is owned by the worker thread and never crosses it, so it
//! needs no locking. Armed timers live in a slot map keyed by handle; a
//! min-heap of deadlines drives wakeups. Cancellation only removes the
//! slot — the heap entry goes stale and is skipped when it surfaces.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

/// Token identifying an armed timer inside the wheel. Opaque to the
/// protocol layer; dead once the timer completes or is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NativeHandle(u64);

enum ArmedCallback {
    Once(Box<dyn FnOnce() + Send>),
    Repeating(Box<dyn FnMut() + Send>),
}

struct Armed {
    deadline: Instant,
    every: Option<Duration>,
    callback: ArmedCallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    deadline: Instant,
    handle: u64,
}

// Reversed so the BinaryHeap pops the earliest deadline first.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
pub(crate) struct TimerWheel {
    slots: HashMap<u64, Armed>,
    deadlines: BinaryHeap<HeapEntry>,
    next_handle: u64,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer that fires once after `delay`.
    pub fn schedule_once(
        &mut self,
        callback: impl FnOnce() + Send + 'static,
        delay: Duration,
    ) -> NativeHandle {
        self.arm(ArmedCallback::Once(Box::new(callback)), delay, None)
    }

    /// Arm a timer that fires every `every` until cancelled.
    pub fn schedule_repeating(
        &mut self,
        callback: impl FnMut() + Send + 'static,
        every: Duration,
    ) -> NativeHandle {
        self.arm(ArmedCallback::Repeating(Box::new(callback)), every, Some(every))
    }

    fn arm(
        &mut self,
        callback: ArmedCallback,
        delay: Duration,
        every: Option<Duration>,
    ) -> NativeHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        let deadline = Instant::now() + delay;
        self.slots.insert(
            handle,
            Armed {
                deadline,
                every,
                callback,
            },
        );
        self.deadlines.push(HeapEntry { deadline, handle });
        NativeHandle(handle)
    }

    /// Disarm a timer. A missing handle means the timer already completed;
    /// that is treated as already-cancelled, not an error.
    pub fn cancel(&mut self, handle: NativeHandle) -> bool {
        self.slots.remove(&handle.0).is_some()
    }

    /// Deadline of the earliest armed timer, if any.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        // Shed stale entries from the top so idle wheels report None.
        while let Some(&entry) = self.deadlines.peek() {
            match self.slots.get(&entry.handle) {
                Some(armed) if armed.deadline == entry.deadline => return Some(entry.deadline),
                _ => {
                    self.deadlines.pop();
                }
            }
        }
        None
    }

    /// Time from `now` until the earliest deadline; zero if already due.
    pub fn until_next_deadline(&mut self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fire every timer due at `now`, earliest deadline first.
    ///
    /// Returns the handles of one-shot timers that completed, so the owner
    /// can release its own bookkeeping for them. Each timer fires at most
    /// once per pass; a repeating timer rescheduled during the pass waits
    /// for the next one.
    pub fn run_due(&mut self, now: Instant) -> Vec<NativeHandle> {
        // Collect due entries first, validating against the slot map:
        // cancelled or superseded-by-reschedule entries are stale.
        let mut due = Vec::new();
        while let Some(&entry) = self.deadlines.peek() {
            if entry.deadline > now {
                break;
            }
            self.deadlines.pop();
            if let Some(armed) = self.slots.get(&entry.handle)
                && armed.deadline == entry.deadline
            {
                due.push(entry.handle);
            }
        }

        let mut completed = Vec::new();
        for handle in due {
            let Some(mut armed) = self.slots.remove(&handle) else {
                continue;
            };
            match armed.callback {
                ArmedCallback::Once(callback) => {
                    callback();
                    completed.push(NativeHandle(handle));
                }
                ArmedCallback::Repeating(ref mut callback) => {
                    callback();
                    if let Some(every) = armed.every {
                        let deadline = Instant::now() + every;
                        armed.deadline = deadline;
                        self.deadlines.push(HeapEntry { deadline, handle });
                        self.slots.insert(handle, armed);
                    }
                }
            }
        }
        completed
    }

    #[cfg(test)]
    fn armed_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let bump = {
            let count = count.clone();
            move || {
                count.fetch_add(1, AtomicOrdering::SeqCst);
            }
        };
        (count, bump)
    }

    #[test]
    fn test_one_shot_fires_once_and_completes() {
        let mut wheel = TimerWheel::new();
        let (count, bump) = counter();
        let handle = wheel.schedule_once(bump, Duration::ZERO);

        let completed = wheel.run_due(Instant::now());
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(completed, vec![handle]);
        assert_eq!(wheel.armed_count(), 0);

        // Nothing left to fire.
        assert!(wheel.run_due(Instant::now()).is_empty());
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_timer_does_not_fire_before_its_deadline() {
        let mut wheel = TimerWheel::new();
        let (count, bump) = counter();
        wheel.schedule_once(bump, Duration::from_secs(60));

        assert!(wheel.run_due(Instant::now()).is_empty());
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(wheel.armed_count(), 1);
    }

    #[test]
    fn test_repeating_reschedules_and_fires_once_per_pass() {
        let mut wheel = TimerWheel::new();
        let (count, bump) = counter();
        wheel.schedule_repeating(bump, Duration::ZERO);

        // Even with a far-future `now`, a single pass fires it once.
        let completed = wheel.run_due(Instant::now() + Duration::from_secs(5));
        assert!(completed.is_empty(), "repeating timers never complete");
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(wheel.armed_count(), 1);

        wheel.run_due(Instant::now() + Duration::from_secs(5));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_cancel_prevents_firing_and_sheds_the_heap_entry() {
        let mut wheel = TimerWheel::new();
        let (count, bump) = counter();
        let handle = wheel.schedule_once(bump, Duration::ZERO);

        assert!(wheel.cancel(handle));
        assert!(wheel.run_due(Instant::now()).is_empty());
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(wheel.next_deadline(), None);
    }

    #[test]
    fn test_cancel_of_completed_handle_is_ignored() {
        let mut wheel = TimerWheel::new();
        let (_, bump) = counter();
        let handle = wheel.schedule_once(bump, Duration::ZERO);
        wheel.run_due(Instant::now());

        assert!(!wheel.cancel(handle));
    }

    #[test]
    fn test_due_timers_fire_in_deadline_order() {
        let mut wheel = TimerWheel::new();
        let order: Arc<parking_lot::Mutex<Vec<u8>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let late = order.clone();
        wheel.schedule_once(
            move || late.lock().push(2),
            Duration::from_millis(20),
        );
        let early = order.clone();
        wheel.schedule_once(
            move || early.lock().push(1),
            Duration::from_millis(1),
        );

        wheel.run_due(Instant::now() + Duration::from_millis(50));
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn test_next_deadline_tracks_the_earliest_live_timer() {
        let mut wheel = TimerWheel::new();
        let (_, bump_a) = counter();
        let (_, bump_b) = counter();
        let near = wheel.schedule_once(bump_a, Duration::from_millis(10));
        wheel.schedule_once(bump_b, Duration::from_secs(10));

        let first = wheel.next_deadline().expect("two timers armed");
        wheel.cancel(near);
        let second = wheel.next_deadline().expect("one timer armed");
        assert!(second > first, "cancelling the near timer moves the deadline out");
    }
}
