//! Tests for host adapters and the drain loop

use prometheus_timers::core::{Callback, Host, Scheduler};
use prometheus_timers::runtime::{DrainReport, EventLoop, IdleMonitor, ManualHost, SystemHost};
use prometheus_timers::util::{Duration, TimeSpec, TimeValue};
use time::UtcOffset;

#[test]
fn test_manual_host_clones_share_clock() {
    let host = ManualHost::new(TimeValue::from_secs(10));
    let other = host.clone();
    host.advance(Duration::from_millis(1_500));
    assert_eq!(other.now(), TimeValue::from_secs(10) + Duration::from_millis(1_500));

    host.set_now(TimeValue::from_secs(3));
    assert_eq!(other.now(), TimeValue::from_secs(3));
}

#[test]
fn test_manual_host_idle_period() {
    let host = ManualHost::new(TimeValue::from_secs(0));
    assert!(host.idle_elapsed().is_none());

    host.begin_idle();
    host.advance(Duration::from_secs(4));
    host.begin_idle();
    host.advance(Duration::from_secs(1));
    assert_eq!(host.idle_elapsed(), Some(Duration::from_secs(5)));

    host.end_idle();
    assert!(host.idle_elapsed().is_none());
}

#[test]
fn test_manual_host_offset() {
    let offset = UtcOffset::from_hms(2, 0, 0).unwrap();
    let host = ManualHost::new(TimeValue::EPOCH).with_offset(offset);
    assert_eq!(host.utc_offset(), offset);
}

#[test]
fn test_idle_monitor_flags() {
    let monitor = IdleMonitor::new();
    assert!(!monitor.is_idle());
    assert!(monitor.idle_elapsed().is_none());

    monitor.mark_idle();
    assert!(monitor.is_idle());
    assert!(!monitor.idle_elapsed().unwrap().is_negative());

    monitor.mark_active();
    assert!(!monitor.is_idle());
}

#[test]
fn test_system_host_reports_monitor_state() {
    let host = SystemHost::new();
    let monitor = host.idle_monitor();
    assert!(host.idle_elapsed().is_none());
    monitor.mark_idle();
    assert!(host.idle_elapsed().is_some());

    let before = TimeValue::now();
    assert!(!host.now().less_than(before));
    assert_eq!(host.utc_offset(), UtcOffset::UTC);
}

#[test]
fn test_drain_on_empty_scheduler() {
    let mut scheduler = Scheduler::with_host(ManualHost::new(TimeValue::EPOCH));
    let mut event_loop = EventLoop::new();
    assert_eq!(event_loop.drain(&mut scheduler), DrainReport::default());
    assert!(!event_loop.is_idle());
}

#[test]
fn test_drain_reports_next_wakeup() {
    let host = ManualHost::new(TimeValue::from_secs(100));
    let mut scheduler = Scheduler::with_host(host.clone());
    scheduler
        .schedule_at(
            TimeSpec::Relative(Duration::from_millis(250)),
            None,
            Callback::new(|_, _| Ok(())),
            vec![],
        )
        .unwrap();

    let mut event_loop = EventLoop::new();
    let report = event_loop.drain(&mut scheduler);
    assert_eq!(report.fired, 0);
    assert_eq!(report.next_wakeup, Some(Duration::from_millis(250)));

    host.advance(Duration::from_millis(250));
    let report = event_loop.drain(&mut scheduler);
    assert_eq!(report.fired, 1);
    assert_eq!(report.next_wakeup, None);
}
