//! Concurrency configuration for a batch run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Largest accepted `max_in_flight`. Matches the permit limit of tokio's
/// semaphore, which panics above it.
pub const MAX_IN_FLIGHT: usize = usize::MAX >> 3;

/// Concurrency policy for one run. Read-only once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Maximum number of task functions executing at the same time.
    pub max_in_flight: usize,

    /// Pause between two successive admissions.
    pub inter_request_delay: Duration,

    /// Overall run deadline, measured from dispatch start.
    pub deadline: Option<Duration>,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 2,
            inter_request_delay: Duration::ZERO,
            deadline: None,
        }
    }
}

impl ConcurrencyConfig {
    /// Create a config with the given concurrency cap and no delay or deadline.
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight,
            ..Self::default()
        }
    }

    /// Builder method to set the delay between admissions.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    /// Builder method to set the run deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Check the config. Values are never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight < 1 {
            return Err(ConfigError::InvalidMaxInFlight(self.max_in_flight));
        }
        if self.max_in_flight > MAX_IN_FLIGHT {
            return Err(ConfigError::MaxInFlightTooLarge {
                got: self.max_in_flight,
                max: MAX_IN_FLIGHT,
            });
        }
        if let Some(deadline) = self.deadline {
            if deadline.is_zero() {
                return Err(ConfigError::InvalidDeadline(deadline));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ConcurrencyConfig::default();
        assert_eq!(config.max_in_flight, 2);
        assert!(config.inter_request_delay.is_zero());
        assert!(config.deadline.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_in_flight_rejected() {
        let config = ConcurrencyConfig::new(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxInFlight(0)));
    }

    #[test]
    fn test_oversized_max_in_flight_rejected() {
        assert!(ConcurrencyConfig::new(MAX_IN_FLIGHT).validate().is_ok());

        let config = ConcurrencyConfig::new(MAX_IN_FLIGHT + 1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MaxInFlightTooLarge {
                got: MAX_IN_FLIGHT + 1,
                max: MAX_IN_FLIGHT,
            })
        );
        assert!(ConcurrencyConfig::new(usize::MAX).validate().is_err());
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let config = ConcurrencyConfig::new(4).with_deadline(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDeadline(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = ConcurrencyConfig::new(8)
            .with_delay(Duration::from_millis(50))
            .with_deadline(Duration::from_secs(20));
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.inter_request_delay, Duration::from_millis(50));
        assert_eq!(config.deadline, Some(Duration::from_secs(20)));
    }
}
