//! Deciding which timers are due and firing them.

use crate::core::{FireOutcome, QueueKind, Scheduler, Trigger};
use crate::infra::queue::QueueEntry;
use crate::util::time::{Duration, TimeValue};

/// Result of one [`EventLoop::drain`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Callbacks run during the pass, including failed ones.
    pub fired: usize,
    /// Time until the next live timer becomes due, if one is known.
    pub next_wakeup: Option<Duration>,
}

/// Host-side driver for a [`Scheduler`].
///
/// Tracks idle transitions so that [`Scheduler::on_idle_start`] is called
/// exactly once per idle period, and fires due timers from both queues in
/// ascending order of how overdue they are.
#[derive(Debug, Default)]
pub struct EventLoop {
    was_idle: bool,
}

impl EventLoop {
    /// A loop that has not yet seen the host idle.
    pub const fn new() -> Self {
        Self { was_idle: false }
    }

    /// Whether the last pass saw the host idle.
    pub const fn is_idle(&self) -> bool {
        self.was_idle
    }

    /// Run every timer that is due now.
    ///
    /// Works from a snapshot of the queues taken at the start of the pass, so
    /// each due timer runs at most once even if its callback re-arms it.
    /// Before a snapshot entry is considered it is checked against the live
    /// timer: entries whose timer was cancelled, moved to the other queue or
    /// re-armed under a different key by an earlier callback are skipped.
    pub fn drain(&mut self, scheduler: &mut Scheduler) -> DrainReport {
        let idle_elapsed = self.track_idle(scheduler);
        let now = scheduler.now();
        let mut active = scheduler.active_queue().snapshot().into_iter().peekable();
        let mut idle = match idle_elapsed {
            Some(_) => scheduler.idle_queue().snapshot(),
            None => Vec::new(),
        }
        .into_iter()
        .peekable();

        let mut report = DrainReport::default();
        loop {
            while active.next_if(|entry| !is_live_active(entry)).is_some() {}
            while idle.next_if(|entry| !is_live_idle(entry)).is_some() {}

            let active_wait = active.peek().map(|entry| entry.key - now);
            let idle_wait = idle
                .peek()
                .zip(idle_elapsed)
                .map(|(entry, elapsed)| entry.key - elapsed);

            let (timer, wait) = match (active_wait, idle_wait) {
                (Some(a), Some(i)) if i < a => (idle.next().map(|entry| entry.timer), i),
                (Some(a), _) => (active.next().map(|entry| entry.timer), a),
                (None, Some(i)) => (idle.next().map(|entry| entry.timer), i),
                (None, None) => break,
            };
            if wait.is_positive() {
                report.next_wakeup = Some(wait);
                break;
            }
            let Some(timer) = timer else { break };
            if !matches!(scheduler.fire_due(&timer), FireOutcome::Skipped) {
                report.fired += 1;
            }
        }
        if report.fired > 0 {
            tracing::trace!(fired = report.fired, "drain pass complete");
        }
        report
    }

    fn track_idle(&mut self, scheduler: &mut Scheduler) -> Option<Duration> {
        let elapsed = scheduler.idle_elapsed();
        match (self.was_idle, elapsed.is_some()) {
            (false, true) => {
                tracing::debug!("host became idle");
                scheduler.on_idle_start();
            }
            (true, false) => tracing::debug!("host became active"),
            _ => {}
        }
        self.was_idle = elapsed.is_some();
        elapsed
    }
}

fn is_live_active(entry: &QueueEntry<TimeValue>) -> bool {
    let timer = &entry.timer;
    !timer.is_triggered()
        && timer.queue() == Some(QueueKind::Active)
        && timer.trigger() == Some(Trigger::At(entry.key))
}

fn is_live_idle(entry: &QueueEntry<Duration>) -> bool {
    let timer = &entry.timer;
    !timer.is_triggered()
        && timer.queue() == Some(QueueKind::Idle)
        && timer.trigger() == Some(Trigger::AfterIdle(entry.key))
}
