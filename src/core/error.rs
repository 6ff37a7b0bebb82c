//! Error types for timer operations.

use thiserror::Error;

use crate::core::timer::TimerId;

/// Errors produced by the scheduler and its inputs.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Arm attempted on a timer with no usable trigger or no callback.
    #[error("invalid timer {id}: {reason}")]
    InvalidTimer {
        /// Offending timer.
        id: TimerId,
        /// What was missing.
        reason: &'static str,
    },
    /// Arm or mutation attempted on a timer that is already queued.
    #[error("timer {0} is already active")]
    AlreadyActive(TimerId),
    /// A time or repeat specification could not be understood.
    #[error("invalid time specification: {0}")]
    InvalidTimeSpec(String),
    /// A callback failed. Reported and swallowed at the fire boundary.
    #[error("error running timer {id} `{callback}`: {message}")]
    Callback {
        /// Timer whose callback failed.
        id: TimerId,
        /// Callback name, or `<anonymous>`.
        callback: String,
        /// Error or panic message.
        message: String,
    },
    /// Configuration rejected by validation.
    #[error("config invalid: {0}")]
    Config(String),
}

/// Application-facing result using anyhow, returned by timer callbacks.
pub type AppResult<T> = Result<T, anyhow::Error>;
