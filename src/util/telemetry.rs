//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Initialize tracing. Hosts can install their own subscriber; this helper
/// installs a default env-based subscriber if none is set.
pub fn init_tracing() {
    install(EnvFilter::from_default_env());
}

/// Like [`init_tracing`] with explicit filter directives such as
/// `"prometheus_timers=debug"`. Returns false when the directives do not
/// parse or a subscriber is already installed.
pub fn init_tracing_with_filter(directives: &str) -> bool {
    EnvFilter::try_new(directives).is_ok_and(install)
}

fn install(filter: EnvFilter) -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}
