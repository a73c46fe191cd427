//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList, etc.)

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::batch::{BatchConfig, BatchReport, BatchStatus, ErrorPolicy, TrialRow};
use crate::measures::Measures;
use crate::models::event::StepTrace;
use crate::models::matching::Matching;

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a field with a default value if missing.
///
/// # Errors
/// Returns error only if type conversion fails (not if field is missing)
fn extract_with_default<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    for<'py> T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

/// Extract an optional field; `None` and a missing key are the same
fn extract_optional<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<T>>
where
    for<'py> T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
        _ => Ok(None),
    }
}

// ========================================================================
// Configuration Parsers
// ========================================================================

/// Convert Python dict to BatchConfig
///
/// Missing keys take the [`BatchConfig::default`] value. Range checks are
/// left to `BatchRunner::new`.
pub fn parse_batch_config(py_config: &Bound<'_, PyDict>) -> PyResult<BatchConfig> {
    let defaults = BatchConfig::default();

    let error_policy = match extract_optional::<String>(py_config, "error_policy")? {
        None => defaults.error_policy,
        Some(policy) => match policy.as_str() {
            "skip" | "SkipAndContinue" => ErrorPolicy::SkipAndContinue,
            "abort" | "AbortOnFirstError" => ErrorPolicy::AbortOnFirstError,
            _ => {
                return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                    "Invalid error_policy: '{}'. Must be 'skip' or 'abort'",
                    policy
                )));
            }
        },
    };

    Ok(BatchConfig {
        num_agents: extract_with_default(py_config, "num_agents", defaults.num_agents)?,
        num_trials: extract_with_default(py_config, "num_trials", defaults.num_trials)?,
        seed: extract_with_default(py_config, "seed", defaults.seed)?,
        error_policy,
        generator_timeout_ms: extract_optional(py_config, "generator_timeout_ms")?,
        max_in_flight: extract_with_default(py_config, "max_in_flight", defaults.max_in_flight)?,
    })
}

// ========================================================================
// Result Converters
// ========================================================================

/// Matching as `{school: student | None}`
pub fn matching_to_py<'py>(py: Python<'py>, matching: &Matching) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for assignment in matching.assignments() {
        dict.set_item(&assignment.school, assignment.student.as_deref())?;
    }
    Ok(dict)
}

/// Step trace as a list of step dicts
pub fn trace_to_py<'py>(py: Python<'py>, trace: &StepTrace) -> PyResult<Bound<'py, PyList>> {
    let steps = PyList::empty(py);
    for record in trace.steps() {
        let dict = PyDict::new(py);
        dict.set_item("step", record.step)?;
        dict.set_item("student", &record.student)?;
        dict.set_item("school", &record.school)?;
        dict.set_item("outcome", record.event_type())?;
        dict.set_item("other", record.outcome.other_student())?;
        dict.set_item("matching", matching_to_py(py, &record.snapshot)?)?;
        steps.append(dict)?;
    }
    Ok(steps)
}

/// Convert Measures to Python dict
pub fn measures_to_py<'py>(py: Python<'py>, measures: &Measures) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);

    let ranks = PyDict::new(py);
    ranks.set_item("students", measures.ranks.students.clone())?;
    ranks.set_item("schools", measures.ranks.schools.clone())?;
    dict.set_item("ranks", ranks)?;

    dict.set_item("avg_rank_students", measures.avg_rank_students)?;
    dict.set_item("avg_rank_schools", measures.avg_rank_schools)?;
    dict.set_item("egalitarian_cost", measures.egalitarian_cost)?;
    dict.set_item("egalitarian_cost_students", measures.egalitarian_cost_students)?;
    dict.set_item("egalitarian_cost_schools", measures.egalitarian_cost_schools)?;
    dict.set_item("welfare", measures.welfare)?;
    dict.set_item("welfare_students", measures.welfare_students)?;
    dict.set_item("welfare_schools", measures.welfare_schools)?;
    dict.set_item("avg_score_students", measures.avg_score_students)?;
    dict.set_item("avg_score_schools", measures.avg_score_schools)?;
    dict.set_item("pareto_optimal", measures.pareto_optimal)?;

    Ok(dict)
}

fn trial_row_to_py<'py>(py: Python<'py>, row: &TrialRow) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("trial", row.trial)?;
    dict.set_item("fingerprint", &row.fingerprint)?;
    dict.set_item("proposals", row.proposals)?;
    dict.set_item("avg_rank_students", row.avg_rank_students)?;
    dict.set_item("avg_rank_schools", row.avg_rank_schools)?;
    dict.set_item("egalitarian_cost", row.egalitarian_cost)?;
    dict.set_item("welfare", row.welfare)?;
    dict.set_item("pareto_optimal", row.pareto_optimal)?;
    Ok(dict)
}

/// Convert BatchReport to Python dict
///
/// Series are exposed column-wise (`series["welfare"]` is a list with one
/// value per successful trial) for direct plotting.
pub fn report_to_py<'py>(py: Python<'py>, report: &BatchReport) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("run_id", report.run_id.to_string())?;

    let status = match report.status {
        BatchStatus::Completed => "completed",
        BatchStatus::Aborted { .. } => "aborted",
        BatchStatus::Cancelled { .. } => "cancelled",
    };
    dict.set_item("status", status)?;
    dict.set_item("successful_trials", report.successful_trials())?;

    let series = PyDict::new(py);
    series.set_item("trial", report.series.trials())?;
    series.set_item("avg_rank_students", report.series.avg_rank_students())?;
    series.set_item("avg_rank_schools", report.series.avg_rank_schools())?;
    series.set_item("egalitarian_cost", report.series.egalitarian_cost())?;
    series.set_item("welfare", report.series.welfare())?;
    series.set_item("pareto_optimal", report.series.pareto_optimal())?;
    dict.set_item("series", series)?;

    let rows = PyList::empty(py);
    for row in report.series.rows() {
        rows.append(trial_row_to_py(py, row)?)?;
    }
    dict.set_item("rows", rows)?;

    let failures = PyList::empty(py);
    for failure in &report.failures {
        let entry = PyDict::new(py);
        entry.set_item("trial", failure.trial)?;
        entry.set_item("error", failure.error.to_string())?;
        failures.append(entry)?;
    }
    dict.set_item("failures", failures)?;

    Ok(dict)
}
