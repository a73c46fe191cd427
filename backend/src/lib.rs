//! Stable Matching Core - Rust Engine
//!
//! Two-sided school choice with deterministic deferred acceptance, outcome
//! measures and batch experiments.
//!
//! # Architecture
//!
//! - **models**: Domain types (Instance, Matching, StepTrace)
//! - **engine**: Student-proposing deferred acceptance
//! - **measures**: Ranks, egalitarian cost, welfare, Pareto and stability checks
//! - **generator**: Instance sources for batch runs
//! - **batch**: Repeated trials, error policy, cancellation, series
//! - **export**: CSV / JSON tables and the instance file format
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. An `Instance` always holds complete, strict preference lists
//! 2. All randomness is deterministic (seeded RNG)
//! 3. The same instance always yields the same matching and trace
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod batch;
pub mod engine;
pub mod export;
pub mod generator;
pub mod measures;
pub mod models;
pub mod rng;

// Re-exports for convenience
pub use batch::{
    BatchConfig, BatchError, BatchReport, BatchRunner, BatchStatus, CancellationHandle,
    ErrorPolicy, TrialErrorKind, TrialFailure, TrialSeries,
};
pub use engine::{MatchOutcome, MatchingError, TraceMode};
pub use generator::{
    AsyncPreferenceGenerator, GeneratorError, PreferenceGenerator, RandomPreferenceGenerator,
};
pub use measures::{compute_measures, MeasureError, Measures};
pub use models::{
    event::{StepOutcome, StepRecord, StepTrace},
    instance::{Instance, InstanceData, InstanceError, Side},
    matching::{Assignment, Matching},
};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn stable_match_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::matching::solve, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::matching::measure, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::matching::run_batch, m)?)?;
    Ok(())
}
