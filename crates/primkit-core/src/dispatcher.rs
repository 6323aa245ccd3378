#![forbid(unsafe_code)]

//! Cooperative scheduling on the UI thread.
//!
//! Two pieces:
//!
//! - [`Dispatcher`]: a FIFO of deferred operations. `begin_invoke` queues,
//!   the host drains with `run_pending` at a safe point of its loop.
//! - [`DispatcherTimer`]: a pull-based timer. The owner calls
//!   [`poll`](DispatcherTimer::poll) with the current time and receives each
//!   elapsed tick in order.
//!
//! # Invariants
//!
//! 1. Deferred operations run in submission order; an operation queued while
//!    draining runs later in the same drain.
//! 2. Timer ticks are reported in strictly increasing due-time order and the
//!    next tick is scheduled from the previous due time, so a late poll
//!    catches up without drift.
//! 3. A stopped timer reports nothing.
//!
//! # Failure Modes
//!
//! - A zero interval is treated as one millisecond to keep catch-up finite.
//!   The first tick alone may be due immediately (see
//!   [`start_after`](DispatcherTimer::start_after)).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

type Operation = Box<dyn FnOnce()>;

/// Cloneable handle to a UI-thread work queue.
#[derive(Clone, Default)]
pub struct Dispatcher {
    queue: Rc<RefCell<VecDeque<Operation>>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Dispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `op` to run at the next drain.
    pub fn begin_invoke(&self, op: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(op));
    }

    /// Number of queued operations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run queued operations until the queue is empty. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(op) = next else {
                return ran;
            };
            op();
            ran += 1;
        }
    }
}

/// A one-shot-then-periodic timer driven by explicit polling.
#[derive(Debug, Clone)]
pub struct DispatcherTimer {
    interval: Duration,
    next_due: Option<Instant>,
    ticks: u64,
}

impl DispatcherTimer {
    /// Create a stopped timer.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: clamp_interval(interval),
            next_due: None,
            ticks: 0,
        }
    }

    /// Current interval.
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval. An already scheduled tick keeps its due time; the
    /// new interval applies from the tick after it.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = clamp_interval(interval);
    }

    /// Start (or restart) so the first tick is due one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.start_after(now, self.interval);
    }

    /// Start (or restart) with the first tick due `first` after `now`.
    ///
    /// `first` may be zero; later ticks follow one interval apart.
    pub fn start_after(&mut self, now: Instant, first: Duration) {
        self.next_due = Some(now + first);
        self.ticks = 0;
    }

    /// Stop; pending ticks are discarded.
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// Whether the timer is running.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.next_due.is_some()
    }

    /// Due time of the next tick.
    #[inline]
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Ticks reported since the last start.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Report one elapsed tick, if any is due at `now`.
    ///
    /// Returns the tick's due time; call repeatedly to catch up.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        let due = self.next_due?;
        if due > now {
            return None;
        }
        self.next_due = Some(due + self.interval);
        self.ticks += 1;
        Some(due)
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    interval.max(Duration::from_millis(1))
}
