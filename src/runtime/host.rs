//! Host implementations: the system clock and a manually driven clock.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use time::UtcOffset;

use crate::core::Host;
use crate::util::time::{Duration, TimeValue};

/// Shared idle flag that input handling can flip from any thread.
///
/// Marking idle twice keeps the original start time; only `mark_active`
/// ends the idle period.
#[derive(Debug, Clone, Default)]
pub struct IdleMonitor {
    idle_since: Arc<Mutex<Option<Instant>>>,
}

impl IdleMonitor {
    /// A monitor in the active state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the host has stopped receiving input.
    pub fn mark_idle(&self) {
        let mut idle_since = self.idle_since.lock();
        if idle_since.is_none() {
            *idle_since = Some(Instant::now());
        }
    }

    /// Record input activity, ending any idle period.
    pub fn mark_active(&self) {
        *self.idle_since.lock() = None;
    }

    /// Whether an idle period is in progress.
    pub fn is_idle(&self) -> bool {
        self.idle_since.lock().is_some()
    }

    /// Time since the idle period began.
    pub fn idle_elapsed(&self) -> Option<Duration> {
        self.idle_since.lock().map(|since| Duration::from(since.elapsed()))
    }
}

/// Host backed by the system wall clock.
#[derive(Debug, Clone)]
pub struct SystemHost {
    idle: IdleMonitor,
    offset: UtcOffset,
}

impl SystemHost {
    /// System clock, UTC for time-of-day specifications.
    pub fn new() -> Self {
        Self::with_offset(UtcOffset::UTC)
    }

    /// System clock with a fixed offset for time-of-day specifications.
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self {
            idle: IdleMonitor::new(),
            offset,
        }
    }

    /// Handle for reporting idle transitions.
    pub fn idle_monitor(&self) -> IdleMonitor {
        self.idle.clone()
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for SystemHost {
    fn now(&self) -> TimeValue {
        TimeValue::now()
    }

    fn idle_elapsed(&self) -> Option<Duration> {
        self.idle.idle_elapsed()
    }

    fn utc_offset(&self) -> UtcOffset {
        self.offset
    }
}

#[derive(Debug)]
struct ManualState {
    now: TimeValue,
    idle_since: Option<TimeValue>,
}

/// A clock that only moves when told to, for simulations and tests.
///
/// Clones share the same clock, so a test can keep one and hand another to
/// the scheduler.
#[derive(Debug, Clone)]
pub struct ManualHost {
    state: Arc<Mutex<ManualState>>,
    offset: UtcOffset,
}

impl ManualHost {
    /// A clock reading `start`, not idle.
    pub fn new(start: TimeValue) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: start,
                idle_since: None,
            })),
            offset: UtcOffset::UTC,
        }
    }

    /// Use `offset` for time-of-day specifications.
    #[must_use]
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Jump to `now`; may move backward.
    pub fn set_now(&self, now: TimeValue) {
        self.state.lock().now = now;
    }

    /// Move the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut state = self.state.lock();
        state.now += delta;
    }

    /// Start an idle period at the current time, unless one is running.
    pub fn begin_idle(&self) {
        let mut state = self.state.lock();
        if state.idle_since.is_none() {
            state.idle_since = Some(state.now);
        }
    }

    /// End the idle period.
    pub fn end_idle(&self) {
        self.state.lock().idle_since = None;
    }
}

impl Host for ManualHost {
    fn now(&self) -> TimeValue {
        self.state.lock().now
    }

    fn idle_elapsed(&self) -> Option<Duration> {
        let state = self.state.lock();
        state.idle_since.map(|since| state.now - since)
    }

    fn utc_offset(&self) -> UtcOffset {
        self.offset
    }
}
