//! Tests for the scheduler builder

use prometheus_timers::builders::SchedulerBuilder;
use prometheus_timers::config::SchedulerConfig;
use prometheus_timers::core::TimerError;
use prometheus_timers::runtime::ManualHost;
use prometheus_timers::util::TimeValue;

#[test]
fn test_builder_defaults() {
    let builder = SchedulerBuilder::new();
    assert_eq!(builder.config(), &SchedulerConfig::default());
    let scheduler = builder.build().unwrap();
    assert!(scheduler.active_queue().is_empty());
    assert!(scheduler.idle_elapsed().is_none());
}

#[test]
fn test_builder_overrides() {
    let host = ManualHost::new(TimeValue::from_secs(500));
    let scheduler = SchedulerBuilder::new()
        .max_repeats(Some(2))
        .history_depth(10)
        .catch_panics(false)
        .with_host(host)
        .build()
        .unwrap();
    assert_eq!(scheduler.config().max_repeats, Some(2));
    assert_eq!(scheduler.config().history_depth, 10);
    assert!(!scheduler.config().catch_panics);
    assert_eq!(scheduler.now(), TimeValue::from_secs(500));
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = SchedulerBuilder::new().history_depth(10_000).build();
    assert!(matches!(result, Err(TimerError::Config(_))));
}
