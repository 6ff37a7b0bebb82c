//! What the scheduler needs from the host event loop.

use time::UtcOffset;

use crate::util::time::{Duration, TimeValue};

/// Clock and idle-state source supplied by the host.
pub trait Host {
    /// Current wall-clock time.
    fn now(&self) -> TimeValue;

    /// Time since the host became idle, or `None` while it is active.
    fn idle_elapsed(&self) -> Option<Duration>;

    /// Offset used to resolve time-of-day specifications.
    fn utc_offset(&self) -> UtcOffset {
        UtcOffset::UTC
    }
}
