//! Tabular and JSON export of engine and batch results.
//!
//! Every writer takes any `io::Write` so callers can target a file, a buffer
//! or stdout. Floats are written with full precision; rounding is a display
//! concern.
//!
//! - [`tables`]: matching, rank, series and step-trace CSV tables
//! - [`instance_csv`]: the `Type,Name,Preferences` instance file format
//! - [`to_json_pretty`] / [`write_json`]: JSON for any serializable record

pub mod instance_csv;
pub mod tables;

use crate::models::instance::InstanceError;
use serde::Serialize;
use std::io;
use thiserror::Error;

pub use instance_csv::{read_instance_csv, write_instance_csv};
pub use tables::{write_matching_csv, write_ranks_csv, write_series_csv, write_trace_csv};

/// Export / import errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Invalid instance: {0}")]
    Instance(#[from] InstanceError),
}

/// Pretty-printed JSON of any serializable record
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write pretty-printed JSON followed by a newline
pub fn write_json<W: io::Write, T: Serialize + ?Sized>(
    mut writer: W,
    value: &T,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}
