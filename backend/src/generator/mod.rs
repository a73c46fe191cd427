//! Preference instance generation.
//!
//! The batch runner gets its instances through a narrow interface:
//!
//! - [`PreferenceGenerator`]: synchronous, called on the runner's thread
//! - [`AsyncPreferenceGenerator`]: may suspend (remote service, worker pool);
//!   the runner can wrap each call in a timeout and keep several in flight
//!
//! Both receive the trial index, so a seeded generator can derive one
//! independent random stream per trial and produce the same instance for a
//! trial no matter in which order trials are dispatched.
//!
//! [`RandomPreferenceGenerator`] is the built-in implementation: every
//! preference list is an independent uniform shuffle of the opposite side.

use crate::models::instance::{Instance, InstanceError};
use crate::rng::RngManager;
use async_trait::async_trait;
use thiserror::Error;

/// Generator failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// The generator could not produce an instance
    #[error("Generator failed: {0}")]
    Failed(String),

    /// The generator produced preference data that is not a valid instance
    #[error("Generator produced an invalid instance: {0}")]
    InvalidInstance(#[from] InstanceError),
}

/// Synchronous instance source
pub trait PreferenceGenerator {
    /// Produce the instance for `trial`, with `n` agents per side
    fn generate(&self, trial: usize, n: usize) -> Result<Instance, GeneratorError>;
}

/// Asynchronous instance source
#[async_trait]
pub trait AsyncPreferenceGenerator: Send + Sync {
    /// Produce the instance for `trial`, with `n` agents per side
    async fn generate(&self, trial: usize, n: usize) -> Result<Instance, GeneratorError>;
}

/// Uniformly random complete preferences from a seeded xorshift64* stream.
///
/// Students are named `Student1..=n` and schools `School1..=n`.
///
/// # Example
///
/// ```rust
/// use stable_match_core_rs::generator::{PreferenceGenerator, RandomPreferenceGenerator};
///
/// let generator = RandomPreferenceGenerator::new(12345);
/// let a = generator.generate(0, 5).unwrap();
/// let b = generator.generate(0, 5).unwrap();
///
/// assert_eq!(a.len(), 5);
/// assert_eq!(a, b); // same seed + same trial = same instance
/// ```
#[derive(Debug, Clone)]
pub struct RandomPreferenceGenerator {
    seed: u64,
}

impl RandomPreferenceGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw an instance from an explicit RNG
    pub fn generate_with(rng: &mut RngManager, n: usize) -> Result<Instance, GeneratorError> {
        if n == 0 {
            return Err(GeneratorError::Failed(
                "number of agents must be positive".to_string(),
            ));
        }

        let students: Vec<String> = (1..=n).map(|i| format!("Student{}", i)).collect();
        let schools: Vec<String> = (1..=n).map(|i| format!("School{}", i)).collect();

        let prefs_students: Vec<(String, Vec<String>)> = students
            .iter()
            .map(|s| {
                let mut list = schools.clone();
                rng.shuffle(&mut list);
                (s.clone(), list)
            })
            .collect();
        let prefs_schools: Vec<(String, Vec<String>)> = schools
            .iter()
            .map(|e| {
                let mut list = students.clone();
                rng.shuffle(&mut list);
                (e.clone(), list)
            })
            .collect();

        Instance::new(students, schools, prefs_students, prefs_schools).map_err(GeneratorError::from)
    }
}

impl PreferenceGenerator for RandomPreferenceGenerator {
    fn generate(&self, trial: usize, n: usize) -> Result<Instance, GeneratorError> {
        let mut rng = RngManager::for_stream(self.seed, trial as u64);
        Self::generate_with(&mut rng, n)
    }
}

#[async_trait]
impl AsyncPreferenceGenerator for RandomPreferenceGenerator {
    async fn generate(&self, trial: usize, n: usize) -> Result<Instance, GeneratorError> {
        PreferenceGenerator::generate(self, trial, n)
    }
}
