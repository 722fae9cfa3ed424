//! CLI configuration.

use std::time::Duration;

use batchrun_core::ConcurrencyConfig;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum concurrent requests.
    pub max_in_flight: usize,

    /// Pause between two request admissions.
    pub delay: Duration,

    /// Overall run deadline.
    pub deadline: Option<Duration>,

    /// Print the report as JSON instead of text.
    pub json: bool,

    /// Minimum time between two progress log lines.
    pub progress_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_in_flight: 2,
            delay: Duration::ZERO,
            deadline: None,
            json: false,
            progress_interval: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Concurrency policy handed to the dispatcher.
    pub fn concurrency(&self) -> ConcurrencyConfig {
        let config = ConcurrencyConfig::new(self.max_in_flight).with_delay(self.delay);
        match self.deadline {
            Some(deadline) => config.with_deadline(deadline),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_from_config() {
        let config = Config {
            max_in_flight: 5,
            delay: Duration::from_millis(20),
            deadline: Some(Duration::from_secs(30)),
            ..Config::default()
        };

        let concurrency = config.concurrency();
        assert_eq!(concurrency.max_in_flight, 5);
        assert_eq!(concurrency.inter_request_delay, Duration::from_millis(20));
        assert_eq!(concurrency.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_default_has_no_deadline() {
        let concurrency = Config::default().concurrency();
        assert_eq!(concurrency, ConcurrencyConfig::default());
    }
}
