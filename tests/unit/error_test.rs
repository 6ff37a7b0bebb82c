//! Tests for error display and conversion

use prometheus_timers::core::{AppResult, TimerError};

#[test]
fn test_invalid_timer_display() {
    let err = TimerError::InvalidTimer {
        id: 7,
        reason: "no callback set",
    };
    assert_eq!(err.to_string(), "invalid timer 7: no callback set");
}

#[test]
fn test_already_active_display() {
    assert_eq!(TimerError::AlreadyActive(3).to_string(), "timer 3 is already active");
}

#[test]
fn test_callback_error_display() {
    let err = TimerError::Callback {
        id: 12,
        callback: "autosave".into(),
        message: "disk full".into(),
    };
    assert_eq!(err.to_string(), "error running timer 12 `autosave`: disk full");
}

#[test]
fn test_config_error_display() {
    let err = TimerError::Config("history_depth too large".into());
    assert_eq!(err.to_string(), "config invalid: history_depth too large");
}

#[test]
fn test_timer_error_converts_into_app_result() {
    fn arm() -> AppResult<()> {
        let parsed: Result<(), TimerError> = Err(TimerError::InvalidTimeSpec("tomorrowish".into()));
        parsed?;
        Ok(())
    }
    let err = arm().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TimerError>(),
        Some(TimerError::InvalidTimeSpec(spec)) if spec == "tomorrowish"
    ));
}
