//! The timer scheduler: arming, cancellation and firing.
//!
//! A [`Scheduler`] owns two queues. The *active* queue holds timers keyed by
//! absolute wall-clock time; the *idle* queue holds timers keyed by how long
//! the host must have been idle. The scheduler never looks at the clock on
//! its own initiative: a host loop (see [`EventLoop`](crate::runtime::EventLoop))
//! peeks at both queues and calls [`Scheduler::fire_due`] for each due timer.
//!
//! Callbacks receive `&mut Scheduler` and may arm or cancel any timer,
//! including the one being fired. `fire_due` is ordered so that this is
//! always well defined: the timer is removed before its callback runs, a
//! repeating timer is re-queued (marked triggered) before its callback
//! runs, and it only becomes live again afterwards if it is still queued.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::config::SchedulerConfig;
use crate::core::history::{FiredEvent, FiredHistory};
use crate::core::host::Host;
use crate::core::timer::{Callback, QueueKind, TimerHandle, TimerId, Trigger};
use crate::core::TimerError;
use crate::infra::queue::TimerQueue;
use crate::util::time::{Duration, TimeValue};
use crate::util::timespec::TimeSpec;

/// Ambient state that callbacks may change but must not leak: it is saved
/// before every callback and restored afterwards.
pub type Context = BTreeMap<String, Value>;

/// What happened to a timer handed to [`Scheduler::fire_due`].
#[derive(Debug)]
pub enum FireOutcome {
    /// The timer was no longer queued; nothing ran.
    Skipped,
    /// The callback ran and returned `Ok`.
    Ran,
    /// The callback failed or panicked. Already logged.
    Failed(TimerError),
}

/// One row of [`Scheduler::list_timers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    /// Timer identifier.
    pub id: TimerId,
    /// Queue holding the timer.
    pub queue: QueueKind,
    /// Trigger time or idle delay.
    pub trigger: Option<Trigger>,
    /// Repeat interval.
    pub repeat: Option<Duration>,
    /// Whether the timer is currently not a candidate to fire.
    pub triggered: bool,
    /// Whether repeats are aligned to multiples of the interval.
    pub integral_multiple: bool,
    /// Callback name.
    pub callback: Option<String>,
}

/// Owner of the active and idle timer queues.
pub struct Scheduler {
    config: SchedulerConfig,
    host: Box<dyn Host>,
    active: TimerQueue<TimeValue>,
    idle: TimerQueue<Duration>,
    history: FiredHistory,
    context: Context,
}

impl Scheduler {
    /// Create a scheduler driven by `host`.
    pub fn new(config: SchedulerConfig, host: Box<dyn Host>) -> Self {
        let history = FiredHistory::new(config.history_depth);
        Self {
            config,
            host,
            active: TimerQueue::new(),
            idle: TimerQueue::new(),
            history,
            context: Context::new(),
        }
    }

    /// Create a scheduler with the default configuration.
    pub fn with_host(host: impl Host + 'static) -> Self {
        Self::new(SchedulerConfig::default(), Box::new(host))
    }

    /// Active configuration.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The host this scheduler reads time from.
    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Host wall-clock time.
    pub fn now(&self) -> TimeValue {
        self.host.now()
    }

    /// Host idle time, `None` while active.
    pub fn idle_elapsed(&self) -> Option<Duration> {
        self.host.idle_elapsed()
    }

    /// Ambient context.
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable ambient context. Changes made by a callback are undone when
    /// the callback returns.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Build an unarmed timer from a time specification.
    ///
    /// `repeat`, when given, must be positive.
    /// [`TimeSpec::NextIntegralMultiple`] requires it and also makes every
    /// repeat land on a multiple of the interval.
    pub fn schedule(
        &self,
        when: TimeSpec,
        repeat: Option<Duration>,
        callback: Callback,
        args: Vec<Value>,
    ) -> Result<TimerHandle, TimerError> {
        if let Some(interval) = repeat {
            if !interval.is_positive() {
                return Err(TimerError::InvalidTimeSpec(format!(
                    "repeat interval must be positive, got {interval}"
                )));
            }
        }
        let at = when.resolve(self.now(), self.host.utc_offset(), repeat)?;
        let timer = TimerHandle::new();
        timer.set_time(at, repeat)?;
        timer.set_integral_multiple(matches!(when, TimeSpec::NextIntegralMultiple))?;
        timer.set_function(callback, args)?;
        Ok(timer)
    }

    /// Build a timer and arm it on the active queue.
    pub fn schedule_at(
        &mut self,
        when: TimeSpec,
        repeat: Option<Duration>,
        callback: Callback,
        args: Vec<Value>,
    ) -> Result<TimerHandle, TimerError> {
        let timer = self.schedule(when, repeat, callback, args)?;
        self.arm(&timer, false)?;
        Ok(timer)
    }

    /// Build an idle timer and arm it, allowing it to fire during the
    /// current idle period (see the hazard on [`Scheduler::arm_for_idle`]).
    pub fn schedule_idle(
        &mut self,
        delay: TimeSpec,
        repeat: bool,
        callback: Callback,
        args: Vec<Value>,
    ) -> Result<TimerHandle, TimerError> {
        let delay = delay.idle_delay()?;
        let timer = TimerHandle::new();
        timer.set_idle_time(delay, repeat)?;
        timer.set_function(callback, args)?;
        self.arm_for_idle(&timer, true)?;
        Ok(timer)
    }

    /// Insert a timer with an absolute trigger time into the active queue.
    ///
    /// With `start_triggered` the timer is queued but marked triggered, so
    /// the event loop passes over it; it still counts as active and can be
    /// cancelled.
    pub fn arm(&mut self, timer: &TimerHandle, start_triggered: bool) -> Result<(), TimerError> {
        let at = {
            let record = timer.record();
            check_armable(record.id, record.queued, record.callback.as_ref())?;
            match record.trigger {
                Some(Trigger::At(at)) => at,
                Some(Trigger::AfterIdle(_)) => {
                    return Err(TimerError::InvalidTimer {
                        id: record.id,
                        reason: "idle timers are armed with arm_for_idle",
                    })
                }
                None => {
                    return Err(TimerError::InvalidTimer {
                        id: record.id,
                        reason: "no trigger time set",
                    })
                }
            }
        };
        self.enqueue_active(timer, at, start_triggered);
        tracing::debug!(timer = timer.id(), %at, "timer armed");
        Ok(())
    }

    /// Insert an idle timer into the idle queue.
    ///
    /// Its delay counts from the start of an idle period. With
    /// `fire_immediately_if_already_idle` the timer is live right away, so
    /// if the host is already idle for longer than the delay it fires on the
    /// very next check. Take care doing this from inside another idle
    /// timer's callback: a delay shorter than the idle time already elapsed
    /// fires the new timer immediately, and a repeating idle timer that
    /// re-arms another this way can fire it once per pass.
    /// Without the flag the timer waits for the next idle period.
    pub fn arm_for_idle(
        &mut self,
        timer: &TimerHandle,
        fire_immediately_if_already_idle: bool,
    ) -> Result<(), TimerError> {
        let delay = {
            let record = timer.record();
            check_armable(record.id, record.queued, record.callback.as_ref())?;
            match record.trigger {
                Some(Trigger::AfterIdle(delay)) => delay,
                Some(Trigger::At(_)) => {
                    return Err(TimerError::InvalidTimer {
                        id: record.id,
                        reason: "absolute timers are armed with arm",
                    })
                }
                None => {
                    return Err(TimerError::InvalidTimer {
                        id: record.id,
                        reason: "no idle delay set",
                    })
                }
            }
        };
        self.enqueue_idle(timer, delay, !fire_immediately_if_already_idle);
        tracing::debug!(timer = timer.id(), %delay, "idle timer armed");
        Ok(())
    }

    /// Remove a timer from whichever queue holds it. Returns whether it was
    /// queued; cancelling an inactive timer is a no-op.
    pub fn cancel(&mut self, timer: &TimerHandle) -> bool {
        let removed = self.detach(timer);
        if let Some(queue) = removed {
            tracing::debug!(timer = timer.id(), ?queue, "timer cancelled");
        }
        removed.is_some()
    }

    /// Cancel every queued timer whose callback is `callback`.
    pub fn cancel_matching(&mut self, callback: &Callback) -> usize {
        let mut doomed: Vec<TimerHandle> = self
            .active
            .iter()
            .filter(|entry| entry.timer.has_callback(callback))
            .map(|entry| entry.timer.clone())
            .collect();
        doomed.extend(
            self.idle
                .iter()
                .filter(|entry| entry.timer.has_callback(callback))
                .map(|entry| entry.timer.clone()),
        );
        for timer in &doomed {
            self.detach(timer);
        }
        tracing::debug!(
            callback = callback.name().unwrap_or("<anonymous>"),
            count = doomed.len(),
            "timers cancelled"
        );
        doomed.len()
    }

    /// Alias of [`Scheduler::cancel_matching`].
    pub fn cancel_all_for(&mut self, callback: &Callback) -> usize {
        self.cancel_matching(callback)
    }

    /// Run one due timer.
    ///
    /// Steps, in order: remove it from its queue (or stop if it is no longer
    /// queued); re-queue repeating timers, marked triggered, with their next
    /// trigger time; run the callback with the ambient context saved and
    /// restored around it, logging and swallowing any failure; finally make a
    /// re-queued active timer live again if the callback left it queued.
    pub fn fire_due(&mut self, timer: &TimerHandle) -> FireOutcome {
        let id = timer.id();
        let Some(queue) = self.detach(timer) else {
            tracing::debug!(timer = id, "timer no longer queued, not running it");
            return FireOutcome::Skipped;
        };
        let (trigger, repeat, integral, callback, args) = {
            let mut record = timer.record_mut();
            record.triggered = true;
            (
                record.trigger,
                record.repeat,
                record.integral_multiple,
                record.callback.clone(),
                Rc::clone(&record.args),
            )
        };

        let mut retrigger = false;
        if let Some(interval) = repeat {
            match trigger {
                Some(Trigger::AfterIdle(delay)) => self.enqueue_idle(timer, delay, true),
                Some(Trigger::At(at)) => {
                    let next = self.next_repeat(at, interval, integral);
                    timer.record_mut().trigger = Some(Trigger::At(next));
                    self.enqueue_active(timer, next, true);
                    retrigger = true;
                }
                None => {}
            }
        }

        let Some(callback) = callback else {
            tracing::warn!(timer = id, "queued timer has no callback");
            return FireOutcome::Skipped;
        };
        let name = callback.name().unwrap_or("<anonymous>").to_owned();
        self.history.record(FiredEvent {
            timer_id: id,
            callback: callback.name().map(str::to_owned),
            queue,
            fired_at: self.now(),
        });

        let saved = self.context.clone();
        let result = {
            let span = tracing::debug_span!("timer", id, callback = %name);
            let _entered = span.enter();
            if self.config.catch_panics {
                panic::catch_unwind(AssertUnwindSafe(|| callback.invoke(self, &args)))
                    .unwrap_or_else(|payload| {
                        Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())))
                    })
            } else {
                callback.invoke(self, &args)
            }
        };
        self.context = saved;

        if retrigger && timer.queue() == Some(QueueKind::Active) {
            timer.record_mut().triggered = false;
        }

        match result {
            Ok(()) => FireOutcome::Ran,
            Err(err) => {
                let error = TimerError::Callback {
                    id,
                    callback: name,
                    message: format!("{err:#}"),
                };
                tracing::error!(timer = id, "{error}");
                FireOutcome::Failed(error)
            }
        }
    }

    /// Make every idle timer live again. Call once per transition into idle.
    pub fn on_idle_start(&mut self) {
        for entry in self.idle.iter() {
            entry.timer.record_mut().triggered = false;
        }
        tracing::trace!(count = self.idle.len(), "idle period started");
    }

    /// Earliest absolute trigger time in the active queue.
    pub fn earliest_active(&self) -> Option<TimeValue> {
        self.active.first_key()
    }

    /// Shortest idle delay in the idle queue.
    pub fn earliest_idle_relative(&self) -> Option<Duration> {
        self.idle.first_key()
    }

    /// The active queue.
    pub const fn active_queue(&self) -> &TimerQueue<TimeValue> {
        &self.active
    }

    /// The idle queue.
    pub const fn idle_queue(&self) -> &TimerQueue<Duration> {
        &self.idle
    }

    /// Active timers in firing order.
    pub fn active_timers(&self) -> Vec<TimerHandle> {
        self.active.iter().map(|entry| entry.timer.clone()).collect()
    }

    /// Idle timers in firing order.
    pub fn idle_timers(&self) -> Vec<TimerHandle> {
        self.idle.iter().map(|entry| entry.timer.clone()).collect()
    }

    /// Whether `timer` is queued in this scheduler.
    pub fn is_active(&self, timer: &TimerHandle) -> bool {
        match timer.queue() {
            Some(QueueKind::Active) => self.active.contains(timer),
            Some(QueueKind::Idle) => self.idle.contains(timer),
            None => false,
        }
    }

    /// Describe every queued timer, active queue first.
    pub fn list_timers(&self) -> Vec<TimerSnapshot> {
        self.active
            .iter()
            .map(|entry| &entry.timer)
            .chain(self.idle.iter().map(|entry| &entry.timer))
            .map(|timer| {
                let record = timer.record();
                TimerSnapshot {
                    id: record.id,
                    queue: record.queued.unwrap_or(QueueKind::Active),
                    trigger: record.trigger,
                    repeat: record.repeat,
                    triggered: record.triggered,
                    integral_multiple: record.integral_multiple,
                    callback: record.callback.as_ref().and_then(Callback::name).map(str::to_owned),
                }
            })
            .collect()
    }

    /// Recently fired timers, newest first.
    pub const fn recent_fired(&self) -> &FiredHistory {
        &self.history
    }

    /// Next trigger after firing at `at`. A backlog of more than
    /// `max_repeats` missed intervals is dropped, leaving the timer one
    /// interval past the last missed slot, which is strictly after now.
    fn next_repeat(&self, at: TimeValue, interval: Duration, integral: bool) -> TimeValue {
        let now = self.now();
        let mut next = at;
        if let Some(max_repeats) = self.config.max_repeats {
            if !now.less_than(at) {
                let missed = (now - at).whole_multiples_of(interval);
                if missed > i128::from(max_repeats) {
                    tracing::warn!(
                        %interval,
                        %missed,
                        "clock jumped ahead, skipping missed repeats"
                    );
                    next += interval.saturating_mul(missed);
                }
            }
        }
        next += interval;
        if integral {
            if let Some(aligned) = now.next_integral_multiple(interval) {
                next = aligned;
            }
        }
        next
    }

    fn enqueue_active(&mut self, timer: &TimerHandle, at: TimeValue, triggered: bool) {
        {
            let mut record = timer.record_mut();
            record.triggered = triggered;
            record.queued = Some(QueueKind::Active);
        }
        self.active.insert(at, timer.clone());
    }

    fn enqueue_idle(&mut self, timer: &TimerHandle, delay: Duration, triggered: bool) {
        {
            let mut record = timer.record_mut();
            record.triggered = triggered;
            record.queued = Some(QueueKind::Idle);
        }
        self.idle.insert(delay, timer.clone());
    }

    fn detach(&mut self, timer: &TimerHandle) -> Option<QueueKind> {
        let queue = timer.queue()?;
        let removed = match queue {
            QueueKind::Active => self.active.remove(timer).is_some(),
            QueueKind::Idle => self.idle.remove(timer).is_some(),
        };
        if !removed {
            // queued in some other scheduler
            return None;
        }
        timer.record_mut().queued = None;
        Some(queue)
    }
}

fn check_armable(
    id: TimerId,
    queued: Option<QueueKind>,
    callback: Option<&Callback>,
) -> Result<(), TimerError> {
    if queued.is_some() {
        return Err(TimerError::AlreadyActive(id));
    }
    if callback.is_none() {
        return Err(TimerError::InvalidTimer {
            id,
            reason: "no callback set",
        });
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
