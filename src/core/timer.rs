//! Timer records, handles and callbacks.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AppResult, Scheduler, TimerError};
use crate::util::time::{Duration, TimeValue};

/// Process-unique timer identifier, used in logs and diagnostics.
pub type TimerId = u64;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Signature of a timer callback.
///
/// Callbacks get the scheduler so they can schedule or cancel timers,
/// including the one currently firing, plus the arguments captured when the
/// timer was set up.
pub type TimerFn = dyn Fn(&mut Scheduler, &[Value]) -> AppResult<()>;

/// A shareable callback with an optional name for error reports.
///
/// Clones share identity: [`Callback::same_as`] is true between a callback
/// and its clones and false between separately constructed callbacks, even
/// if they wrap the same function.
#[derive(Clone)]
pub struct Callback {
    name: Option<Rc<str>>,
    func: Rc<TimerFn>,
}

impl Callback {
    /// Wrap an anonymous function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Scheduler, &[Value]) -> AppResult<()> + 'static,
    {
        Self {
            name: None,
            func: Rc::new(f),
        }
    }

    /// Wrap a function under a name shown in logs and listings.
    pub fn named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Scheduler, &[Value]) -> AppResult<()> + 'static,
    {
        let name: String = name.into();
        Self {
            name: Some(Rc::from(name)),
            func: Rc::new(f),
        }
    }

    /// Name given at construction.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.func), Rc::as_ptr(&other.func))
    }

    pub(crate) fn invoke(&self, scheduler: &mut Scheduler, args: &[Value]) -> AppResult<()> {
        (self.func)(scheduler, args)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Which queue a timer sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    /// Ordered by absolute trigger time.
    Active,
    /// Ordered by delay from the start of an idle period.
    Idle,
}

/// When a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// At an absolute wall-clock time.
    At(TimeValue),
    /// Once the host has been idle for this long.
    AfterIdle(Duration),
}

/// The state behind a [`TimerHandle`].
#[derive(Debug)]
pub struct TimerRecord {
    pub(crate) id: TimerId,
    /// True when the timer is not a live candidate to fire.
    pub(crate) triggered: bool,
    pub(crate) trigger: Option<Trigger>,
    /// For idle timers, `Some` means "again every idle period".
    pub(crate) repeat: Option<Duration>,
    pub(crate) callback: Option<Callback>,
    pub(crate) args: Rc<[Value]>,
    pub(crate) integral_multiple: bool,
    pub(crate) queued: Option<QueueKind>,
}

/// Shared reference to one timer.
///
/// Clones refer to the same timer, so cancelling or re-arming through any
/// clone affects all of them.
#[derive(Clone)]
pub struct TimerHandle(Rc<RefCell<TimerRecord>>);

impl TimerHandle {
    /// A blank, inactive timer with no trigger and no callback.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(TimerRecord {
            id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
            triggered: true,
            trigger: None,
            repeat: None,
            callback: None,
            args: Rc::from(Vec::new()),
            integral_multiple: false,
            queued: None,
        })))
    }

    pub(crate) fn record(&self) -> Ref<'_, TimerRecord> {
        self.0.borrow()
    }

    pub(crate) fn record_mut(&self) -> RefMut<'_, TimerRecord> {
        self.0.borrow_mut()
    }

    /// Identifier for logs.
    pub fn id(&self) -> TimerId {
        self.record().id
    }

    /// True unless the timer is a live candidate to fire.
    pub fn is_triggered(&self) -> bool {
        self.record().triggered
    }

    /// Trigger time or idle delay.
    pub fn trigger(&self) -> Option<Trigger> {
        self.record().trigger
    }

    /// Repeat interval, if any.
    pub fn repeat(&self) -> Option<Duration> {
        self.record().repeat
    }

    /// Whether this timer is measured against idle time.
    pub fn is_idle(&self) -> bool {
        matches!(self.record().trigger, Some(Trigger::AfterIdle(_)))
    }

    /// Whether repeats are aligned to multiples of the interval.
    pub fn integral_multiple(&self) -> bool {
        self.record().integral_multiple
    }

    /// Queue currently holding the timer.
    pub fn queue(&self) -> Option<QueueKind> {
        self.record().queued
    }

    /// Name of the callback, if it has one.
    pub fn callback_name(&self) -> Option<String> {
        self.record().callback.as_ref().and_then(Callback::name).map(str::to_owned)
    }

    /// Whether the callback is `callback` (by identity).
    pub fn has_callback(&self, callback: &Callback) -> bool {
        self.record().callback.as_ref().is_some_and(|own| own.same_as(callback))
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Set an absolute trigger time and optional repeat interval.
    pub fn set_time(&self, at: TimeValue, repeat: Option<Duration>) -> Result<(), TimerError> {
        let mut record = self.inactive_record()?;
        record.trigger = Some(Trigger::At(at));
        record.repeat = repeat;
        Ok(())
    }

    /// Make this an idle timer firing `delay` into each idle period.
    pub fn set_idle_time(&self, delay: Duration, repeat_each_idle: bool) -> Result<(), TimerError> {
        let mut record = self.inactive_record()?;
        record.trigger = Some(Trigger::AfterIdle(delay));
        record.repeat = repeat_each_idle.then_some(delay);
        record.integral_multiple = false;
        Ok(())
    }

    /// Set the callback and the arguments it will be called with.
    pub fn set_function(&self, callback: Callback, args: Vec<Value>) -> Result<(), TimerError> {
        let mut record = self.inactive_record()?;
        record.callback = Some(callback);
        record.args = Rc::from(args);
        Ok(())
    }

    /// Align repeats to exact multiples of the interval since the epoch.
    pub fn set_integral_multiple(&self, enabled: bool) -> Result<(), TimerError> {
        self.inactive_record()?.integral_multiple = enabled;
        Ok(())
    }

    /// Shift the trigger time (or idle delay) by `delta`, which may be negative.
    pub fn inc_time(&self, delta: Duration) -> Result<(), TimerError> {
        let mut record = self.inactive_record()?;
        record.trigger = match record.trigger {
            Some(Trigger::At(at)) => Some(Trigger::At(at + delta)),
            Some(Trigger::AfterIdle(delay)) => Some(Trigger::AfterIdle(delay + delta)),
            None => {
                return Err(TimerError::InvalidTimer {
                    id: record.id,
                    reason: "no trigger time set",
                })
            }
        };
        Ok(())
    }

    /// Time left until an absolute timer fires; negative when overdue.
    /// `None` for idle timers and timers without a trigger.
    pub fn until(&self, now: TimeValue) -> Option<Duration> {
        match self.record().trigger {
            Some(Trigger::At(at)) => Some(at - now),
            _ => None,
        }
    }

    fn inactive_record(&self) -> Result<RefMut<'_, TimerRecord>, TimerError> {
        let record = self.record_mut();
        if record.queued.is_some() {
            return Err(TimerError::AlreadyActive(record.id));
        }
        Ok(record)
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TimerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TimerHandle {}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record();
        f.debug_struct("TimerHandle")
            .field("id", &record.id)
            .field("trigger", &record.trigger)
            .field("repeat", &record.repeat)
            .field("triggered", &record.triggered)
            .field("queued", &record.queued)
            .finish_non_exhaustive()
    }
}
