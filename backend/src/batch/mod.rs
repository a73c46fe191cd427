//! Batch experiments: many independent trials of generate + match + measure.
//!
//! # Critical Invariants
//!
//! 1. Series entries are in trial order, one per successful trial
//! 2. A failed trial never adds a partial row; it is listed in the report
//! 3. The same seed and config always reproduce the same series

pub mod config;
pub mod runner;
pub mod series;

pub use config::{BatchConfig, BatchError, ErrorPolicy};
pub use runner::{
    BatchReport, BatchRunner, BatchStatus, CancellationHandle, TrialErrorKind, TrialFailure,
};
pub use series::{SeriesSummary, TrialRow, TrialSeries};
