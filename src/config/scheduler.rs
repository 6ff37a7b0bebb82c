//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Largest accepted `history_depth`.
pub const MAX_HISTORY_DEPTH: usize = 64;

/// Tunables for a [`Scheduler`](crate::core::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Missed repeats tolerated before the backlog of a repeating timer is
    /// collapsed into a single firing. `None` never collapses.
    pub max_repeats: Option<u32>,
    /// Number of fired timers remembered for diagnostics.
    pub history_depth: usize,
    /// Longest sleep between drain passes in the async driver.
    pub max_poll_interval_ms: u64,
    /// Catch panics raised by callbacks instead of unwinding into the host.
    pub catch_panics: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_repeats: Some(10),
            history_depth: 3,
            max_poll_interval_ms: 1_000,
            catch_panics: true,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_poll_interval_ms == 0 {
            return Err("max_poll_interval_ms must be greater than 0".into());
        }
        if self.history_depth > MAX_HISTORY_DEPTH {
            return Err(format!(
                "history_depth must be at most {MAX_HISTORY_DEPTH}, got {}",
                self.history_depth
            ));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build from `TIMER_*` environment variables, loading `.env` first if
    /// one exists. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup("TIMER_MAX_REPEATS") {
            cfg.max_repeats = if raw.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse_var("TIMER_MAX_REPEATS", &raw)?)
            };
        }
        if let Some(raw) = lookup("TIMER_HISTORY_DEPTH") {
            cfg.history_depth = parse_var("TIMER_HISTORY_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("TIMER_MAX_POLL_INTERVAL_MS") {
            cfg.max_poll_interval_ms = parse_var("TIMER_MAX_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("TIMER_CATCH_PANICS") {
            cfg.catch_panics = parse_var("TIMER_CATCH_PANICS", &raw)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| format!("{key}: {e}"))
}
