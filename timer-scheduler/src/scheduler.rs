//! The detector thread, worker pool, and lifecycle of §4.2.4 and §5.
//!
//! One dedicated thread ("the detector") owns the scheduling queue and the
//! timer map behind a single `Mutex` + `Condvar`; callbacks run on a private
//! `rayon::ThreadPool`, the same shape as the teacher's worker thread
//! (`trendlab-tui/src/worker.rs`: "creates a private rayon::ThreadPool (not
//! the global pool)"). There is no recursive locking: the detector never
//! calls user code itself, only `pool.spawn`s it.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use trading_core::domain::{datetime_from_date_and_time, Datetime, TimeDelta};

use crate::error::SchedulerError;
use crate::queue::{SchedulingQueue, TimerId};
use crate::timer::{TimerSpec, INFINITE};

/// How long the detector waits on an empty queue before re-checking
/// `running` — bounds the latency of `stop()` when no timer is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// A snapshot of scheduler activity (not named in spec.md; the natural
/// observability surface for a concurrent scheduler with no logging
/// framework in the ambient stack — see `SPEC_FULL.md`). Grounded in the
/// pack's `EventQueue::total_inserted`/`total_popped` diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerMetrics {
    pub fired: u64,
    pub missed: u64,
    pub dropped_stale: u64,
    pub live_timers: usize,
}

struct TimerState {
    spec: TimerSpec,
    repeat_remaining: u32,
}

struct Inner {
    running: bool,
    heap: SchedulingQueue,
    timers: HashMap<TimerId, TimerState>,
    next_id: TimerId,
    dropped_stale: u64,
}

impl Inner {
    fn new() -> Self {
        Inner {
            running: false,
            heap: SchedulingQueue::new(),
            timers: HashMap::new(),
            next_id: 0,
            dropped_stale: 0,
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    cv: Condvar,
    pool: rayon::ThreadPool,
    fired: AtomicU64,
    missed: AtomicU64,
}

/// The concurrent timer scheduler of §4.2 / §5.
///
/// `addFunc`/`start`/`stop` only ever block on the mutex; the detector
/// blocks on the condvar or a timed wait; workers block on the pool queue —
/// matching §5's "no recursive locking" and the three named blocking points.
pub struct Scheduler {
    shared: Arc<Shared>,
    detector: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Build a scheduler with a private worker pool of `num_threads`
    /// threads. Not yet running; call [`Scheduler::start`].
    pub fn new(num_threads: usize) -> Result<Self, SchedulerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .thread_name(|i| format!("timer-scheduler-worker-{i}"))
            .build()
            .map_err(|e| SchedulerError::PoolInit(e.to_string()))?;

        Ok(Scheduler {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::new()),
                cv: Condvar::new(),
                pool,
                fired: AtomicU64::new(0),
                missed: AtomicU64::new(0),
            }),
            detector: Mutex::new(None),
        })
    }

    /// Register a timer. Validated per §4.2.1; if the scheduler is already
    /// running the timer is immediately scheduled (its first instant
    /// computed against the current time), otherwise it waits in the timer
    /// map until the next `start()`.
    pub fn add_func(&self, spec: TimerSpec) -> Result<TimerId, SchedulerError> {
        spec.validate()?;
        let mut inner = self.shared.inner.lock().expect("scheduler mutex poisoned");

        let id = allocate_id(&mut inner)?;
        let repeat_remaining = spec.repeat_num;
        let running = inner.running;
        let first_instant = initial_instant(Datetime::now(), &spec);
        inner.timers.insert(id, TimerState { spec, repeat_remaining });

        if running {
            inner.heap.push(first_instant, id);
            drop(inner);
            self.shared.cv.notify_all();
        }

        Ok(id)
    }

    /// Cancel a timer. A stale heap entry that later surfaces is detected
    /// by lookup miss and skipped (§5 "Cancellation").
    pub fn remove(&self, id: TimerId) -> bool {
        let mut inner = self.shared.inner.lock().expect("scheduler mutex poisoned");
        inner.timers.remove(&id).is_some()
    }

    /// Idempotently transition stopped→running: rebuild the heap from live
    /// timers (dropping already-expired ones), spawn the detector thread.
    pub fn start(&self) {
        let mut detector_slot = self.detector.lock().expect("detector mutex poisoned");
        let mut inner = self.shared.inner.lock().expect("scheduler mutex poisoned");
        if inner.running {
            return;
        }
        inner.running = true;

        inner.heap.clear();
        let now = Datetime::now();
        let mut expired = Vec::new();
        for (&id, state) in inner.timers.iter() {
            let first = initial_instant(now, &state.spec);
            if first > state.spec.end_instant() {
                expired.push(id);
            }
        }
        for id in &expired {
            inner.timers.remove(id);
        }
        inner.dropped_stale += expired.len() as u64;

        let entries: Vec<(Datetime, TimerId)> = inner
            .timers
            .iter()
            .map(|(&id, state)| (initial_instant(now, &state.spec), id))
            .collect();
        for (instant, id) in entries {
            inner.heap.push(instant, id);
        }

        drop(inner);
        self.shared.cv.notify_all();

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("timer-scheduler-detector".into())
            .spawn(move || detector_loop(&shared))
            .expect("failed to spawn detector thread");
        *detector_slot = Some(handle);
    }

    /// Clear the heap and wake the detector, which observes `running` false
    /// and exits; `stop()` joins it. Already-dispatched callbacks run to
    /// completion on the worker pool (best-effort, per §5).
    pub fn stop(&self) {
        let mut detector_slot = self.detector.lock().expect("detector mutex poisoned");
        {
            let mut inner = self.shared.inner.lock().expect("scheduler mutex poisoned");
            if !inner.running {
                return;
            }
            inner.running = false;
            inner.heap.clear();
        }
        self.shared.cv.notify_all();

        if let Some(handle) = detector_slot.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.inner.lock().expect("scheduler mutex poisoned").running
    }

    pub fn metrics(&self) -> SchedulerMetrics {
        let inner = self.shared.inner.lock().expect("scheduler mutex poisoned");
        SchedulerMetrics {
            fired: self.shared.fired.load(Ordering::Relaxed),
            missed: self.shared.missed.load(Ordering::Relaxed),
            dropped_stale: inner.dropped_stale,
            live_timers: inner.timers.len(),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Monotonic id allocation with wraparound probing (§4.2.3): on overflow,
/// probe forward for the first id not already in use by a live timer.
fn allocate_id(inner: &mut Inner) -> Result<TimerId, SchedulerError> {
    if inner.timers.len() >= TimerId::MAX as usize {
        return Err(SchedulerError::IdSpaceExhausted);
    }
    let start = inner.next_id;
    loop {
        let candidate = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);
        if !inner.timers.contains_key(&candidate) {
            return Ok(candidate);
        }
        if inner.next_id == start {
            return Err(SchedulerError::IdSpaceExhausted);
        }
    }
}

/// Initial scheduling on `start()` (§4.2.2 "Initial scheduling"): first
/// instant is `now + duration`, then snapped into the daily window.
fn initial_instant(now: Datetime, spec: &TimerSpec) -> Datetime {
    let first = now + spec.duration;
    if !spec.has_daily_window() {
        return first;
    }

    let today = first.date();
    let start_today = datetime_from_date_and_time(today, spec.start_time);
    let end_today = datetime_from_date_and_time(today, spec.end_time);

    if first < start_today {
        return start_today;
    }
    if first > end_today {
        return datetime_from_date_and_time(today + chrono::Days::new(1), spec.start_time) + TimeDelta::from_micros(1);
    }

    // Round up to the nearest start_time + k * duration. When the window
    // doesn't evenly divide by duration, that grid point can itself land
    // past end_time (e.g. a 60-min window with an 89-min duration) — treat
    // that the same as "after window" and roll to tomorrow's open, so the
    // snapped instant always honors the window (§4.2.2, P9).
    let elapsed = (first - start_today).ticks();
    let step = spec.duration.ticks().max(1);
    let k = (elapsed + step - 1) / step;
    let snapped = start_today + TimeDelta::from_ticks(k * step);
    if snapped > end_today {
        datetime_from_date_and_time(today + chrono::Days::new(1), spec.start_time) + TimeDelta::from_micros(1)
    } else {
        snapped
    }
}

/// The fire procedure of §4.2.2: compute the next instant after firing at
/// `fired`, applying the lifetime bound (step 5) and the daily-window
/// rollover (step 6). `None` means the timer's lifetime has ended.
fn advance(fired: Datetime, spec: &TimerSpec) -> Option<Datetime> {
    let mut next = fired + spec.duration;
    if spec.has_daily_window() {
        let today = fired.date();
        let end_today = datetime_from_date_and_time(today, spec.end_time);
        if next > end_today {
            next = datetime_from_date_and_time(today + chrono::Days::new(1), spec.start_time) + TimeDelta::from_micros(1);
        }
    }
    if next > spec.end_instant() {
        return None;
    }
    Some(next)
}

/// What the detector should do this iteration, decided while still holding
/// the lock (§5's detector-loop pseudocode: "Lock, peek heap; ...").
enum NextAction {
    /// Heap empty: wait up to the idle poll interval.
    Idle,
    /// Earliest entry is in the future: wait up to `Duration`, or until cv
    /// is signalled by a new `addFunc`/`start`/`stop`.
    WaitUntil(Duration),
    /// Earliest entry is due: pop and dispatch it.
    Dispatch,
}

fn detector_loop(shared: &Arc<Shared>) {
    loop {
        let mut inner = shared.inner.lock().expect("scheduler mutex poisoned");
        if !inner.running {
            return;
        }

        let action = match inner.heap.peek() {
            None => NextAction::Idle,
            Some(entry) => {
                let now = Datetime::now();
                if entry.instant <= now {
                    NextAction::Dispatch
                } else {
                    let diff = (entry.instant - now).ticks().max(0) as u64;
                    NextAction::WaitUntil(Duration::from_micros(diff).min(IDLE_POLL))
                }
            }
        };

        match action {
            NextAction::Idle => {
                let (_guard, _timeout) = shared.cv.wait_timeout(inner, IDLE_POLL).expect("scheduler mutex poisoned");
            }
            NextAction::WaitUntil(wait_for) => {
                let (_guard, _timeout) = shared.cv.wait_timeout(inner, wait_for).expect("scheduler mutex poisoned");
            }
            NextAction::Dispatch => {
                let entry = inner.heap.pop().expect("peeked entry must be poppable");
                let Some(timer) = inner.timers.get_mut(&entry.timer_id) else {
                    // Cancelled since it was scheduled (§5 "Cancellation").
                    inner.dropped_stale += 1;
                    continue;
                };

                let callback = timer.spec.callback.clone();
                let next_instant = advance(entry.instant, &timer.spec);

                if timer.repeat_remaining != INFINITE {
                    timer.repeat_remaining -= 1;
                }
                let exhausted = timer.repeat_remaining == 0;

                if let Some(next) = next_instant.filter(|_| !exhausted) {
                    inner.heap.push(next, entry.timer_id);
                } else {
                    inner.timers.remove(&entry.timer_id);
                }

                drop(inner);
                shared.fired.fetch_add(1, Ordering::Relaxed);
                let dispatched_on = Arc::clone(shared);
                shared.pool.spawn(move || {
                    let result = std::panic::catch_unwind(AssertUnwindSafe(|| (callback)()));
                    if result.is_err() {
                        dispatched_on.missed.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;

    fn noop() -> crate::timer::Callback {
        Arc::new(|| {})
    }

    fn dt(days: i64, time: TimeDelta) -> Datetime {
        Datetime::from_unix_micros(days * TimeDelta::one_day().ticks()) + time
    }

    #[test]
    fn initial_instant_with_no_window_is_now_plus_duration() {
        let spec = TimerSpec::repeating(dt(0, TimeDelta::zero()), TimeDelta::from_mins(5), 10, noop());
        let now = dt(3, TimeDelta::from_hms(12, 0, 0));
        assert_eq!(initial_instant(now, &spec), now + TimeDelta::from_mins(5));
    }

    #[test]
    fn initial_instant_before_window_snaps_to_start_time() {
        let spec = TimerSpec::daily_window(
            dt(0, TimeDelta::zero()).date(),
            dt(365, TimeDelta::zero()).date(),
            TimeDelta::from_hms(9, 30, 0),
            TimeDelta::from_hms(15, 0, 0),
            TimeDelta::from_hours(1),
            INFINITE,
            noop(),
        );
        // now + duration lands at 07:00, before the 09:30 window opens.
        let now = dt(10, TimeDelta::from_hms(6, 0, 0));
        let first = initial_instant(now, &spec);
        assert_eq!(first, dt(10, TimeDelta::from_hms(9, 30, 0)));
    }

    #[test]
    fn initial_instant_after_window_snaps_to_next_day() {
        let spec = TimerSpec::daily_window(
            dt(0, TimeDelta::zero()).date(),
            dt(365, TimeDelta::zero()).date(),
            TimeDelta::from_hms(9, 30, 0),
            TimeDelta::from_hms(15, 0, 0),
            TimeDelta::from_hours(1),
            INFINITE,
            noop(),
        );
        // Scenario 6 of spec.md §8: started at 14:45, duration 1h -> 15:45, past the 15:00 close.
        let now = dt(10, TimeDelta::from_hms(14, 45, 0));
        let first = initial_instant(now, &spec);
        assert_eq!(first, dt(11, TimeDelta::from_hms(9, 30, 0)) + TimeDelta::from_micros(1));
    }

    #[test]
    fn initial_instant_inside_window_rounds_up_to_a_grid_point() {
        let spec = TimerSpec::daily_window(
            dt(0, TimeDelta::zero()).date(),
            dt(365, TimeDelta::zero()).date(),
            TimeDelta::from_hms(9, 30, 0),
            TimeDelta::from_hms(15, 0, 0),
            TimeDelta::from_hours(1),
            INFINITE,
            noop(),
        );
        // now + duration lands at 11:05, between grid points 10:30 and 11:30.
        let now = dt(10, TimeDelta::from_hms(10, 5, 0));
        let first = initial_instant(now, &spec);
        assert_eq!(first, dt(10, TimeDelta::from_hms(11, 30, 0)));
    }

    #[test]
    fn advance_rolls_over_to_next_days_start_time() {
        let spec = TimerSpec::daily_window(
            dt(0, TimeDelta::zero()).date(),
            dt(365, TimeDelta::zero()).date(),
            TimeDelta::from_hms(9, 30, 0),
            TimeDelta::from_hms(15, 0, 0),
            TimeDelta::from_hours(1),
            INFINITE,
            noop(),
        );
        // Fired at 14:30; +1h = 15:30, past the 15:00 close -> roll to tomorrow's open.
        let fired = dt(20, TimeDelta::from_hms(14, 30, 0));
        let next = advance(fired, &spec).unwrap();
        assert_eq!(next, dt(21, TimeDelta::from_hms(9, 30, 0)) + TimeDelta::from_micros(1));
    }

    #[test]
    fn advance_past_end_date_deletes_the_timer() {
        let spec = TimerSpec::daily_window(
            dt(0, TimeDelta::zero()).date(),
            dt(5, TimeDelta::zero()).date(),
            TimeDelta::from_hms(9, 30, 0),
            TimeDelta::from_hms(15, 0, 0),
            TimeDelta::from_hours(1),
            INFINITE,
            noop(),
        );
        let fired = dt(4, TimeDelta::from_hms(14, 30, 0));
        assert_eq!(advance(fired, &spec), None);
    }

    proptest! {
        /// P9: no instant produced by repeated `advance()` calls ever falls
        /// outside its day's `[start_time, end_time]` window.
        #[test]
        fn p9_advance_never_escapes_the_daily_window(
            start_hour in 0i64..20,
            window_hours in 1i64..4,
            duration_mins in 5i64..90,
            steps in 1usize..40,
        ) {
            let start_time = TimeDelta::from_hms(start_hour, 0, 0);
            let end_time = TimeDelta::from_hms((start_hour + window_hours).min(23), 59, 0);
            prop_assume!(end_time >= start_time);

            let spec = TimerSpec::daily_window(
                dt(0, TimeDelta::zero()).date(),
                dt(3650, TimeDelta::zero()).date(),
                start_time,
                end_time,
                TimeDelta::from_mins(duration_mins),
                INFINITE,
                noop(),
            );

            let mut instant = initial_instant(dt(100, TimeDelta::from_hms(start_hour, 0, 0)), &spec);
            for _ in 0..steps {
                let tod = instant.time_of_day();
                prop_assert!(tod >= start_time && tod <= end_time + TimeDelta::from_micros(1));
                instant = match advance(instant, &spec) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
    }

    #[test]
    fn id_allocation_probes_forward_past_live_ids() {
        let mut inner = Inner::new();
        inner.timers.insert(0, TimerState { spec: TimerSpec::repeating(dt(0, TimeDelta::zero()), TimeDelta::from_mins(1), 1, noop()), repeat_remaining: 1 });
        inner.timers.insert(1, TimerState { spec: TimerSpec::repeating(dt(0, TimeDelta::zero()), TimeDelta::from_mins(1), 1, noop()), repeat_remaining: 1 });
        inner.next_id = 0;

        let id = allocate_id(&mut inner).unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn id_allocation_reuses_freed_ids_on_wraparound() {
        let mut inner = Inner::new();
        inner.next_id = TimerId::MAX;
        let first = allocate_id(&mut inner).unwrap();
        assert_eq!(first, TimerId::MAX);
        inner.timers.insert(first, TimerState { spec: TimerSpec::repeating(dt(0, TimeDelta::zero()), TimeDelta::from_mins(1), 1, noop()), repeat_remaining: 1 });

        let second = allocate_id(&mut inner).unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn scheduler_start_stop_is_idempotent_and_joins_cleanly() {
        let scheduler = Scheduler::new(1).unwrap();
        assert!(!scheduler.is_running());
        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn add_func_rejects_invalid_spec() {
        let scheduler = Scheduler::new(1).unwrap();
        let bad = TimerSpec::daily_window(
            dt(1, TimeDelta::zero()).date(),
            dt(0, TimeDelta::zero()).date(),
            TimeDelta::from_hms(9, 0, 0),
            TimeDelta::from_hms(10, 0, 0),
            TimeDelta::from_mins(1),
            1,
            noop(),
        );
        assert!(scheduler.add_func(bad).is_err());
    }

    #[test]
    fn fires_exactly_repeat_num_times_then_stops_scheduling_it() {
        let scheduler = Scheduler::new(2).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_cb = Arc::clone(&count);

        let spec = TimerSpec::repeating(
            Datetime::now(),
            TimeDelta::from_millis(15),
            3,
            Arc::new(move || {
                count_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );
        scheduler.add_func(spec).unwrap();
        scheduler.start();

        std::thread::sleep(Duration::from_millis(400));
        scheduler.stop();

        assert_eq!(count.load(Ordering::SeqCst), 3);
        let metrics = scheduler.metrics();
        assert_eq!(metrics.fired, 3);
        assert_eq!(metrics.live_timers, 0);
    }

    #[test]
    fn stop_quiescence_no_callbacks_after_stop() {
        let scheduler = Scheduler::new(2).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_cb = Arc::clone(&count);

        let spec = TimerSpec::repeating(
            Datetime::now(),
            TimeDelta::from_millis(15),
            INFINITE,
            Arc::new(move || {
                count_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );
        scheduler.add_func(spec).unwrap();
        scheduler.start();
        std::thread::sleep(Duration::from_millis(100));
        scheduler.stop();

        // Let any in-flight dispatch settle before taking the baseline.
        std::thread::sleep(Duration::from_millis(50));
        let after_stop = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn panicking_callback_is_caught_and_counted_as_missed() {
        let scheduler = Scheduler::new(2).unwrap();
        let spec = TimerSpec::repeating(Datetime::now(), TimeDelta::from_millis(15), 1, Arc::new(|| panic!("boom")));
        scheduler.add_func(spec).unwrap();
        scheduler.start();
        std::thread::sleep(Duration::from_millis(200));
        scheduler.stop();

        let metrics = scheduler.metrics();
        assert_eq!(metrics.fired, 1);
        assert_eq!(metrics.missed, 1);
    }

    #[test]
    fn remove_prevents_a_pending_timer_from_firing() {
        let scheduler = Scheduler::new(2).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_cb = Arc::clone(&count);

        let spec = TimerSpec::repeating(
            Datetime::now(),
            TimeDelta::from_millis(500),
            5,
            Arc::new(move || {
                count_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let id = scheduler.add_func(spec).unwrap();
        scheduler.start();
        assert!(scheduler.remove(id));
        std::thread::sleep(Duration::from_millis(600));
        scheduler.stop();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
