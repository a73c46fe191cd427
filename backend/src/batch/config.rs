//! Batch configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// What the runner does when a trial fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Record the failure and move on to the next trial (default)
    #[default]
    SkipAndContinue,

    /// Record the failure and stop the batch
    AbortOnFirstError,
}

/// Batch configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Complete batch configuration
///
/// # Fields
///
/// * `num_agents` - Agents per side in every generated instance
/// * `num_trials` - Number of independent trials
/// * `seed` - Base seed for the built-in random generator
/// * `error_policy` - Skip or abort on a failed trial
/// * `generator_timeout_ms` - Per-call limit for async generators
/// * `max_in_flight` - Async generator calls dispatched concurrently
///
/// Missing fields take their default when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub num_agents: usize,
    pub num_trials: usize,
    pub seed: u64,
    pub error_policy: ErrorPolicy,
    pub generator_timeout_ms: Option<u64>,
    pub max_in_flight: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_agents: 10,
            num_trials: 10,
            seed: 12345,
            error_policy: ErrorPolicy::SkipAndContinue,
            generator_timeout_ms: None,
            max_in_flight: 1,
        }
    }
}

impl BatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.num_agents == 0 {
            return Err(BatchError::InvalidConfig(
                "num_agents must be > 0".to_string(),
            ));
        }

        if self.num_trials == 0 {
            return Err(BatchError::InvalidConfig(
                "num_trials must be > 0".to_string(),
            ));
        }

        if self.max_in_flight == 0 {
            return Err(BatchError::InvalidConfig(
                "max_in_flight must be > 0".to_string(),
            ));
        }

        if self.generator_timeout_ms == Some(0) {
            return Err(BatchError::InvalidConfig(
                "generator_timeout_ms must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-call generator timeout, if any
    pub fn generator_timeout(&self) -> Option<Duration> {
        self.generator_timeout_ms.map(Duration::from_millis)
    }
}
