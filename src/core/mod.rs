//! Core timer abstractions: records, queues' owner and firing logic.

pub mod error;
pub mod history;
pub mod host;
pub mod scheduler;
pub mod timer;

pub use error::{AppResult, TimerError};
pub use history::{FiredEvent, FiredHistory};
pub use host::Host;
pub use scheduler::{Context, FireOutcome, Scheduler, TimerSnapshot};
pub use timer::{Callback, QueueKind, TimerFn, TimerHandle, TimerId, TimerRecord, Trigger};
