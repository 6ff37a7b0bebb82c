//! Tests for configuration validation

use std::collections::HashMap;

use prometheus_timers::config::{SchedulerConfig, MAX_HISTORY_DEPTH};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let cfg = SchedulerConfig::default();
    assert_eq!(cfg.max_repeats, Some(10));
    assert_eq!(cfg.history_depth, 3);
    assert_eq!(cfg.max_poll_interval_ms, 1_000);
    assert!(cfg.catch_panics);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_invalid_poll_interval() {
    let invalid = SchedulerConfig {
        max_poll_interval_ms: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_history_depth() {
    let invalid = SchedulerConfig {
        history_depth: MAX_HISTORY_DEPTH + 1,
        ..SchedulerConfig::default()
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("history_depth"));
}

#[test]
fn test_config_from_json_fills_defaults() {
    let cfg = SchedulerConfig::from_json_str(r#"{ "max_repeats": null, "history_depth": 8 }"#)
        .unwrap();
    assert_eq!(cfg.max_repeats, None);
    assert_eq!(cfg.history_depth, 8);
    assert_eq!(cfg.max_poll_interval_ms, 1_000);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("{ not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "max_poll_interval_ms": 0 }"#).is_err());
}

#[test]
fn test_config_from_lookup() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("TIMER_MAX_REPEATS", "25"),
        ("TIMER_HISTORY_DEPTH", " 5 "),
        ("TIMER_CATCH_PANICS", "false"),
    ]))
    .unwrap();
    assert_eq!(cfg.max_repeats, Some(25));
    assert_eq!(cfg.history_depth, 5);
    assert!(!cfg.catch_panics);
    assert_eq!(cfg.max_poll_interval_ms, 1_000);
}

#[test]
fn test_config_from_lookup_disables_max_repeats() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[("TIMER_MAX_REPEATS", "None")])).unwrap();
    assert_eq!(cfg.max_repeats, None);
}

#[test]
fn test_config_from_lookup_reports_bad_value() {
    let err = SchedulerConfig::from_lookup(lookup(&[("TIMER_MAX_POLL_INTERVAL_MS", "soon")]))
        .unwrap_err();
    assert!(err.starts_with("TIMER_MAX_POLL_INTERVAL_MS"));
}
