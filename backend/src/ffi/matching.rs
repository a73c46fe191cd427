//! PyO3 functions for matching, measuring and batch runs
//!
//! Preferences cross the boundary as ordered dicts `{agent: [ranked ids]}`;
//! dict insertion order is the order agents are served in.
//!
//! # Example (from Python)
//!
//! ```python
//! from stable_match_core_rs import solve, measure, run_batch
//!
//! students = {"A": ["X", "Y"], "B": ["Y", "X"]}
//! schools = {"X": ["A", "B"], "Y": ["B", "A"]}
//!
//! result = solve(students, schools, trace=True)
//! print(result["matching"])          # {'X': 'A', 'Y': 'B'}
//! print(len(result["trace"]))        # 2
//!
//! m = measure(students, schools, result["matching"])
//! print(m["welfare"], m["pareto_optimal"])
//!
//! report = run_batch({"num_agents": 10, "num_trials": 50, "seed": 7})
//! print(report["series"]["welfare"])
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{matching_to_py, measures_to_py, parse_batch_config, report_to_py, trace_to_py};
use crate::batch::BatchRunner;
use crate::engine::{self, MatchingError, TraceMode};
use crate::generator::RandomPreferenceGenerator;
use crate::measures::compute_measures;
use crate::models::instance::Instance;
use crate::models::matching::Matching;

/// Ordered `(agent, preferences)` rows from a Python dict
fn preference_rows(dict: &Bound<'_, PyDict>) -> PyResult<Vec<(String, Vec<String>)>> {
    dict.iter()
        .map(|(agent, prefs)| Ok((agent.extract()?, prefs.extract()?)))
        .collect()
}

fn build_instance(
    students: &Bound<'_, PyDict>,
    schools: &Bound<'_, PyDict>,
) -> PyResult<Instance> {
    Instance::from_rows(preference_rows(students)?, preference_rows(schools)?)
        .map_err(|e| PyErr::new::<PyValueError, _>(format!("Invalid instance: {}", e)))
}

/// Run deferred acceptance
///
/// # Returns
///
/// Dictionary with:
/// - `matching`: `{school: student}`
/// - `proposals`: number of proposals made
/// - `trace`: list of step dicts (only when `trace=True`)
///
/// # Errors
///
/// Raises ValueError on invalid preferences, RuntimeError if the engine
/// fails.
#[pyfunction]
#[pyo3(signature = (students, schools, trace = false))]
pub fn solve<'py>(
    py: Python<'py>,
    students: &Bound<'py, PyDict>,
    schools: &Bound<'py, PyDict>,
    trace: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let mode = if trace {
        TraceMode::Enabled
    } else {
        TraceMode::Disabled
    };

    let outcome = engine::solve_preferences(preference_rows(students)?, preference_rows(schools)?, mode)
        .map_err(|e| match e {
            MatchingError::InvalidInstance(_) => PyErr::new::<PyValueError, _>(e.to_string()),
            MatchingError::PreferencesExhausted { .. } => PyErr::new::<PyRuntimeError, _>(e.to_string()),
        })?;

    let dict = PyDict::new(py);
    dict.set_item("matching", matching_to_py(py, &outcome.matching)?)?;
    dict.set_item("proposals", outcome.proposals)?;
    if let Some(steps) = &outcome.trace {
        dict.set_item("trace", trace_to_py(py, steps)?)?;
    }
    Ok(dict)
}

/// Compute measures of a `{school: student | None}` matching
///
/// # Errors
///
/// Raises ValueError on invalid preferences or a matching that does not
/// fit the instance.
#[pyfunction]
pub fn measure<'py>(
    py: Python<'py>,
    students: &Bound<'py, PyDict>,
    schools: &Bound<'py, PyDict>,
    matching: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyDict>> {
    let instance = build_instance(students, schools)?;

    let pairs = matching
        .iter()
        .map(|(school, student)| Ok((school.extract::<String>()?, student.extract::<Option<String>>()?)))
        .collect::<PyResult<Vec<_>>>()?;
    let matching = Matching::from_pairs(pairs);

    let measures = compute_measures(&instance, &matching)
        .map_err(|e| PyErr::new::<PyValueError, _>(format!("Invalid matching: {}", e)))?;

    measures_to_py(py, &measures)
}

/// Run a batch of random trials
///
/// `config` keys: `num_agents`, `num_trials`, `seed`, `error_policy`
/// (`"skip"` or `"abort"`), `max_in_flight`, `generator_timeout_ms`.
/// Missing keys take their defaults.
///
/// # Errors
///
/// Raises ValueError on an invalid configuration.
#[pyfunction]
pub fn run_batch<'py>(py: Python<'py>, config: &Bound<'py, PyDict>) -> PyResult<Bound<'py, PyDict>> {
    let config = parse_batch_config(config)?;
    let generator = RandomPreferenceGenerator::new(config.seed);

    let runner = BatchRunner::new(config)
        .map_err(|e| PyErr::new::<PyValueError, _>(e.to_string()))?;
    let report = py.allow_threads(|| runner.run(&generator));

    report_to_py(py, &report)
}
