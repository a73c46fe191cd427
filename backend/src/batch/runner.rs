//! Batch trial runner.
//!
//! Repeats generation + matching + measurement over `num_trials` independent
//! trials:
//!
//! ```text
//! For each trial t (in order):
//! 1. Check cancellation (skipped once every trial has been attempted)
//! 2. Generate an instance of size n (optionally under a timeout)
//! 3. Check the instance size
//! 4. Run the engine (tracing disabled)
//! 5. Compute measures
//! 6. Append a row to the series, or record a TrialFailure
//! 7. Stop if the failure policy says so
//! ```
//!
//! # Ordering
//!
//! The async runner may keep several generator calls in flight, but results
//! are consumed in trial order, so the i-th row always belongs to the i-th
//! successful trial.
//!
//! # Cancellation
//!
//! A cancel applies to the batch that is running, or to the next one if none
//! is. The runner clears its flag when a batch returns, so a runner can be
//! reused after a cancelled batch.

use crate::batch::config::{BatchConfig, BatchError, ErrorPolicy};
use crate::batch::series::{TrialRow, TrialSeries};
use crate::engine::{self, TraceMode};
use crate::generator::{AsyncPreferenceGenerator, GeneratorError, PreferenceGenerator};
use crate::measures::compute_measures;
use crate::models::instance::Instance;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why a single trial failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TrialErrorKind {
    #[error("Generator failure: {0}")]
    Generator(String),

    #[error("Generator timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Generator returned {actual} agents per side, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Matching failure: {0}")]
    Matching(String),

    #[error("Measure failure: {0}")]
    Measure(String),
}

impl From<GeneratorError> for TrialErrorKind {
    fn from(err: GeneratorError) -> Self {
        TrialErrorKind::Generator(err.to_string())
    }
}

/// A failed trial and the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub trial: usize,
    pub error: TrialErrorKind,
}

/// How the batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    /// Every trial was attempted
    Completed,

    /// Stopped after `trial` failed under `AbortOnFirstError`
    Aborted { trial: usize },

    /// Stopped on request after `attempted` trials
    Cancelled { attempted: usize },
}

/// Everything a batch produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub config: BatchConfig,
    pub status: BatchStatus,
    pub series: TrialSeries,
    pub failures: Vec<TrialFailure>,
}

impl BatchReport {
    /// Number of trials whose measures are in the series
    pub fn successful_trials(&self) -> usize {
        self.series.len()
    }

    /// Number of trials attempted (successful + failed)
    pub fn attempted_trials(&self) -> usize {
        self.series.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Completed
    }
}

/// Cloneable stop switch for a running batch.
///
/// Cancelling lets the trial in flight finish, then the runner returns the
/// partial report.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear a pending cancel
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Outcome of recording one trial
enum Flow {
    Continue,
    Stop,
}

/// Series + failures being filled during one batch
struct Accumulator {
    policy: ErrorPolicy,
    series: TrialSeries,
    failures: Vec<TrialFailure>,
    status: BatchStatus,
}

impl Accumulator {
    fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            series: TrialSeries::new(),
            failures: Vec::new(),
            status: BatchStatus::Completed,
        }
    }

    fn record(&mut self, trial: usize, result: Result<TrialRow, TrialErrorKind>) -> Flow {
        match result {
            Ok(row) => {
                debug!(
                    trial,
                    welfare = row.welfare,
                    egalitarian_cost = row.egalitarian_cost,
                    pareto_optimal = row.pareto_optimal,
                    "trial completed"
                );
                self.series.push(row);
                Flow::Continue
            }
            Err(error) => {
                warn!(trial, error = %error, "trial failed");
                self.failures.push(TrialFailure { trial, error });
                match self.policy {
                    ErrorPolicy::SkipAndContinue => Flow::Continue,
                    ErrorPolicy::AbortOnFirstError => {
                        self.status = BatchStatus::Aborted { trial };
                        Flow::Stop
                    }
                }
            }
        }
    }

    fn attempted(&self) -> usize {
        self.series.len() + self.failures.len()
    }

    fn cancel(&mut self) {
        self.status = BatchStatus::Cancelled {
            attempted: self.attempted(),
        };
    }

    fn finish(self, config: &BatchConfig) -> BatchReport {
        let report = BatchReport {
            run_id: Uuid::new_v4(),
            config: config.clone(),
            status: self.status,
            series: self.series,
            failures: self.failures,
        };
        info!(
            run_id = %report.run_id,
            status = ?report.status,
            successful = report.successful_trials(),
            failed = report.failures.len(),
            "batch finished"
        );
        report
    }
}

/// Runs batches of independent trials.
///
/// # Example
///
/// ```rust
/// use stable_match_core_rs::batch::{BatchConfig, BatchRunner};
/// use stable_match_core_rs::generator::RandomPreferenceGenerator;
///
/// let config = BatchConfig {
///     num_agents: 5,
///     num_trials: 3,
///     ..Default::default()
/// };
/// let runner = BatchRunner::new(config).unwrap();
/// let report = runner.run(&RandomPreferenceGenerator::new(42));
///
/// assert_eq!(report.successful_trials(), 3);
/// assert!(report.is_complete());
/// ```
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: BatchConfig,
    cancellation: CancellationHandle,
}

impl BatchRunner {
    /// Create a runner, validating the configuration
    pub fn new(config: BatchConfig) -> Result<Self, BatchError> {
        config.validate()?;
        Ok(Self {
            config,
            cancellation: CancellationHandle::new(),
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Handle that stops this runner's batches
    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.cancellation.clone()
    }

    /// Run the batch with a synchronous generator
    pub fn run<G>(&self, generator: &G) -> BatchReport
    where
        G: PreferenceGenerator + ?Sized,
    {
        let n = self.config.num_agents;
        let mut acc = Accumulator::new(self.config.error_policy);
        info!(
            num_agents = n,
            num_trials = self.config.num_trials,
            "batch started"
        );

        for trial in 0..self.config.num_trials {
            if self.cancellation.is_cancelled() {
                acc.cancel();
                break;
            }

            let result = generator
                .generate(trial, n)
                .map_err(TrialErrorKind::from)
                .and_then(|instance| evaluate_trial(trial, n, &instance));

            if let Flow::Stop = acc.record(trial, result) {
                break;
            }
        }

        self.cancellation.reset();
        acc.finish(&self.config)
    }

    /// Run the batch with an asynchronous generator.
    ///
    /// Up to `max_in_flight` generator calls run concurrently; each is cut
    /// off after `generator_timeout_ms` if set. Results are consumed in trial
    /// order.
    pub async fn run_async<G>(&self, generator: &G) -> BatchReport
    where
        G: AsyncPreferenceGenerator + ?Sized,
    {
        let n = self.config.num_agents;
        let timeout = self.config.generator_timeout();
        let mut acc = Accumulator::new(self.config.error_policy);
        info!(
            num_agents = n,
            num_trials = self.config.num_trials,
            max_in_flight = self.config.max_in_flight,
            "async batch started"
        );

        let mut generated = stream::iter(0..self.config.num_trials)
            .map(|trial| async move {
                let call = generator.generate(trial, n);
                let result = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, call).await {
                        Ok(result) => result.map_err(TrialErrorKind::from),
                        Err(_) => Err(TrialErrorKind::Timeout {
                            timeout_ms: limit.as_millis() as u64,
                        }),
                    },
                    None => call.await.map_err(TrialErrorKind::from),
                };
                (trial, result)
            })
            .buffered(self.config.max_in_flight);

        loop {
            // A cancel that lands while the last trial is in flight changes nothing
            if acc.attempted() < self.config.num_trials && self.cancellation.is_cancelled() {
                acc.cancel();
                break;
            }

            let Some((trial, instance)) = generated.next().await else {
                break;
            };
            let result = instance.and_then(|instance| evaluate_trial(trial, n, &instance));

            if let Flow::Stop = acc.record(trial, result) {
                break;
            }
        }

        self.cancellation.reset();
        acc.finish(&self.config)
    }
}

/// Match and measure one generated instance
fn evaluate_trial(trial: usize, n: usize, instance: &Instance) -> Result<TrialRow, TrialErrorKind> {
    if instance.len() != n {
        return Err(TrialErrorKind::SizeMismatch {
            expected: n,
            actual: instance.len(),
        });
    }

    let outcome = engine::run(instance, TraceMode::Disabled)
        .map_err(|e| TrialErrorKind::Matching(e.to_string()))?;
    let measures = compute_measures(instance, &outcome.matching)
        .map_err(|e| TrialErrorKind::Measure(e.to_string()))?;

    Ok(TrialRow::from_measures(
        trial,
        instance.fingerprint(),
        outcome.proposals,
        &measures,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RandomPreferenceGenerator;

    #[test]
    fn test_size_mismatch_is_a_trial_failure() {
        let instance = PreferenceGenerator::generate(&RandomPreferenceGenerator::new(1), 0, 3).unwrap();

        let err = evaluate_trial(0, 4, &instance).unwrap_err();
        assert_eq!(
            err,
            TrialErrorKind::SizeMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_cancel_before_start_returns_empty_report() {
        let runner = BatchRunner::new(BatchConfig::default()).unwrap();
        runner.cancellation_handle().cancel();

        let report = runner.run(&RandomPreferenceGenerator::new(1));

        assert_eq!(report.status, BatchStatus::Cancelled { attempted: 0 });
        assert!(report.series.is_empty());
    }

    #[test]
    fn test_cancel_is_cleared_when_batch_returns() {
        let runner = BatchRunner::new(BatchConfig::default()).unwrap();
        let handle = runner.cancellation_handle();
        handle.cancel();

        runner.run(&RandomPreferenceGenerator::new(1));

        assert!(!handle.is_cancelled());
    }
}
