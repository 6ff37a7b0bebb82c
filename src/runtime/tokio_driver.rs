//! Tokio driver that keeps draining a scheduler until told to stop.

use std::time::Duration as StdDuration;

use tokio::sync::watch;

use crate::config::SchedulerConfig;
use crate::core::Scheduler;
use crate::runtime::event_loop::EventLoop;
use crate::util::time::Duration;

/// Sleeps until the next timer is due, drains, and repeats.
///
/// The scheduler is not `Send`, so the driver runs on the thread that owns
/// it: a current-thread runtime or a `LocalSet`.
#[derive(Debug)]
pub struct TokioDriver {
    event_loop: EventLoop,
    max_poll: StdDuration,
}

impl TokioDriver {
    /// Create a driver that never sleeps longer than
    /// `config.max_poll_interval_ms`, so idle transitions and newly armed
    /// timers are noticed.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            event_loop: EventLoop::new(),
            max_poll: StdDuration::from_millis(config.max_poll_interval_ms),
        }
    }

    /// Drive `scheduler` until `shutdown` reads `true` or its sender is
    /// dropped. Returns the number of callbacks run.
    pub async fn run(
        &mut self,
        scheduler: &mut Scheduler,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut fired = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            let report = self.event_loop.drain(scheduler);
            fired += report.fired;
            if *shutdown.borrow() {
                break;
            }
            // Repeats re-armed during the pass may already be due again.
            let wait = if report.fired > 0 {
                StdDuration::ZERO
            } else {
                report
                    .next_wakeup
                    .and_then(Duration::to_std)
                    .map_or(self.max_poll, |due| due.min(self.max_poll))
            };
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(fired, "timer driver stopped");
        fired
    }
}
