//! Tests for the fired-timer history

use prometheus_timers::core::{FiredEvent, FiredHistory, QueueKind};
use prometheus_timers::util::TimeValue;

fn event(id: u64, secs: i64) -> FiredEvent {
    FiredEvent {
        timer_id: id,
        callback: Some(format!("cb-{id}")),
        queue: QueueKind::Active,
        fired_at: TimeValue::from_secs(secs),
    }
}

#[test]
fn test_history_keeps_newest_first() {
    let mut history = FiredHistory::new(3);
    for id in 1..=5 {
        history.record(event(id, 100 + i64::try_from(id).unwrap()));
    }

    assert_eq!(history.len(), 3);
    let ids: Vec<u64> = history.events().iter().map(|e| e.timer_id).collect();
    assert_eq!(ids, vec![5, 4, 3]);
    assert_eq!(history.latest().map(|e| e.timer_id), Some(5));
    assert_eq!(history.nth_latest(2).map(|e| e.timer_id), Some(3));
    assert!(history.nth_latest(3).is_none());
}

#[test]
fn test_zero_depth_history_records_nothing() {
    let mut history = FiredHistory::new(0);
    history.record(event(1, 1));
    assert!(history.is_empty());
    assert!(history.latest().is_none());
}

#[test]
fn test_event_serializes() {
    let json = serde_json::to_value(event(9, 42)).unwrap();
    assert_eq!(json["timer_id"], 9);
    assert_eq!(json["callback"], "cb-9");
    assert_eq!(json["queue"], "active");
}
