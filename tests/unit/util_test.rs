//! Tests for time arithmetic, time specifications and telemetry

use prometheus_timers::util::{
    init_tracing, init_tracing_with_filter, parse_duration, Duration, TimeSpec, TimeValue,
    PICOS_PER_SEC,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::UtcOffset;

#[test]
fn test_add_then_subtract_round_trips() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..1_000 {
        let t = TimeValue::from_picos(rng.random_range(-(10_i128.pow(24))..10_i128.pow(24)));
        let d = Duration::from_picos(rng.random_range(-(10_i128.pow(22))..10_i128.pow(22)));
        assert_eq!((t + d) - d, t);
        assert_eq!((t + d) - t, d);
        assert!(t.subsec_picos() < 1_000_000_000_000);
    }
}

#[test]
fn test_comparison_across_resolutions() {
    let micros = TimeValue::from_micros(5, 1);
    let picos = TimeValue::from_picos(5 * PICOS_PER_SEC + 1_000_000);
    assert_eq!(micros, picos);
    assert!(micros.less_than(TimeValue::from_picos(5 * PICOS_PER_SEC + 1_000_001)));
    assert!(TimeValue::from_picos(-1).less_than(TimeValue::EPOCH));
}

#[test]
fn test_next_integral_multiple_of_minute() {
    let t = TimeValue::from_secs(1_000 * 60 + 23);
    assert_eq!(
        t.next_integral_multiple(Duration::from_secs(60)),
        Some(TimeValue::from_secs(1_001 * 60))
    );
    assert_eq!(t.next_integral_multiple(Duration::ZERO), None);
}

#[test]
fn test_next_integral_multiple_fractional_seconds() {
    let t = TimeValue::from_secs(10) + Duration::from_millis(1_234);
    assert_eq!(
        t.next_integral_multiple_secs(0.5),
        Some(TimeValue::from_secs(11) + Duration::from_millis(500))
    );
    assert_eq!(t.next_integral_multiple_secs(f64::NAN), None);
    assert_eq!(t.next_integral_multiple_secs(-1.0), None);
}

#[test]
fn test_parse_time_specs() {
    assert_eq!("now".parse::<TimeSpec>().unwrap(), TimeSpec::Now);
    assert_eq!(
        "2.5".parse::<TimeSpec>().unwrap(),
        TimeSpec::Relative(Duration::from_millis(2_500))
    );
    assert_eq!(
        "3 weeks".parse::<TimeSpec>().unwrap(),
        TimeSpec::Relative(Duration::from_secs(3 * 604_800))
    );
    assert_eq!(
        "11:30pm".parse::<TimeSpec>().unwrap(),
        TimeSpec::ClockTime { hour: 23, minute: 30 }
    );
    assert_eq!(
        "12am".parse::<TimeSpec>().unwrap(),
        TimeSpec::ClockTime { hour: 0, minute: 0 }
    );
    assert!("25:00".parse::<TimeSpec>().is_err());
    assert!("13pm".parse::<TimeSpec>().is_err());
    assert!("soonish".parse::<TimeSpec>().is_err());
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("month"), Some(Duration::from_secs(2_592_000)));
    assert_eq!(parse_duration("2 years"), Some(Duration::from_secs(63_115_200)));
    assert_eq!(parse_duration("500 microsec"), Some(Duration::from_components(0, 500, 0)));
    assert_eq!(parse_duration(""), None);
    assert_eq!(parse_duration("5 parsecs"), None);
}

#[test]
fn test_clock_time_resolves_today_in_offset() {
    // 2023-11-14 22:13:20 UTC
    let now = TimeValue::from_secs(1_700_000_000);
    let midnight = 1_699_920_000;

    let utc = TimeSpec::ClockTime { hour: 9, minute: 30 }
        .resolve(now, UtcOffset::UTC, None)
        .unwrap();
    assert_eq!(utc, TimeValue::from_secs(midnight + 9 * 3_600 + 30 * 60));

    // already 2023-11-15 in UTC+3, and 09:30 there is 06:30 UTC
    let plus_three = UtcOffset::from_hms(3, 0, 0).unwrap();
    let local = TimeSpec::ClockTime { hour: 9, minute: 30 }
        .resolve(now, plus_three, None)
        .unwrap();
    assert_eq!(local, TimeValue::from_secs(midnight + 86_400 + 6 * 3_600 + 30 * 60));
}

#[test]
fn test_integral_spec_needs_repeat() {
    let now = TimeValue::from_secs(90);
    assert!(TimeSpec::NextIntegralMultiple.resolve(now, UtcOffset::UTC, None).is_err());
    assert_eq!(
        TimeSpec::NextIntegralMultiple
            .resolve(now, UtcOffset::UTC, Some(Duration::from_secs(60)))
            .unwrap(),
        TimeValue::from_secs(120)
    );
}

#[test]
fn test_time_spec_serde() {
    let spec = TimeSpec::ClockTime { hour: 7, minute: 5 };
    let json = serde_json::to_string(&spec).unwrap();
    assert_eq!(serde_json::from_str::<TimeSpec>(&json).unwrap(), spec);
    assert_eq!(serde_json::to_value(TimeSpec::Now).unwrap(), "now");
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    assert!(!init_tracing_with_filter("prometheus_timers=debug"));
    assert!(!init_tracing_with_filter("prometheus_timers=[unclosed"));
}
