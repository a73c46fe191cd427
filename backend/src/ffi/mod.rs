//! Python bindings (feature `pyo3`)
//!
//! Thin adapter: dicts in, dicts out. No matching logic lives here.

pub mod matching;
pub mod types;
