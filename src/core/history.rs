//! Record of the most recently fired timers.
//!
//! Purely diagnostic: nothing in the scheduler reads it back.

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::timer::{QueueKind, TimerId};
use crate::util::time::TimeValue;

/// One fired timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredEvent {
    /// Timer identifier.
    pub timer_id: TimerId,
    /// Callback name, if any.
    pub callback: Option<String>,
    /// Queue the timer fired from.
    pub queue: QueueKind,
    /// Host time when the callback was started.
    pub fired_at: TimeValue,
}

/// Bounded, newest-first history of fired timers.
#[derive(Debug, Clone)]
pub struct FiredHistory {
    events: VecDeque<FiredEvent>,
    max_events: usize,
}

impl FiredHistory {
    /// Create a history that keeps at most `max_events` entries.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Remember a fired timer, forgetting the oldest one when full.
    pub fn record(&mut self, event: FiredEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_back();
        }
        self.events.push_front(event);
    }

    /// Most recent first.
    pub fn events(&self) -> Vec<FiredEvent> {
        self.events.iter().cloned().collect()
    }

    /// The `n`th most recent event, 0 being the latest.
    pub fn nth_latest(&self, n: usize) -> Option<&FiredEvent> {
        self.events.get(n)
    }

    /// The latest event.
    pub fn latest(&self) -> Option<&FiredEvent> {
        self.nth_latest(0)
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing has fired yet.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
