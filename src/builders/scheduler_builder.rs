//! Builder that validates configuration and wires a host into a scheduler.

use crate::config::SchedulerConfig;
use crate::core::{Host, Scheduler, TimerError};
use crate::runtime::SystemHost;

/// Assemble a [`Scheduler`] from configuration and a host.
///
/// Without an explicit host the scheduler reads the system clock.
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    host: Option<Box<dyn Host>>,
}

impl SchedulerBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the drift-correction ceiling; `None` disables collapsing.
    #[must_use]
    pub fn max_repeats(mut self, max_repeats: Option<u32>) -> Self {
        self.config.max_repeats = max_repeats;
        self
    }

    /// Set how many fired timers are remembered.
    #[must_use]
    pub fn history_depth(mut self, depth: usize) -> Self {
        self.config.history_depth = depth;
        self
    }

    /// Set whether callback panics are caught.
    #[must_use]
    pub fn catch_panics(mut self, catch: bool) -> Self {
        self.config.catch_panics = catch;
        self
    }

    /// Use `host` for time and idle state.
    #[must_use]
    pub fn with_host(mut self, host: impl Host + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    /// Configuration as currently set.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate the configuration and build the scheduler.
    pub fn build(self) -> Result<Scheduler, TimerError> {
        self.config.validate().map_err(TimerError::Config)?;
        let host = self.host.unwrap_or_else(|| Box::new(SystemHost::new()));
        tracing::debug!(config = ?self.config, "scheduler built");
        Ok(Scheduler::new(self.config, host))
    }
}
