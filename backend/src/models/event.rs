//! Step trace of a deferred-acceptance run.
//!
//! This module defines the records produced when the engine runs with
//! tracing enabled. The trace lets an external renderer replay the run one
//! proposal at a time:
//! - which student proposed to which school
//! - how the school answered
//! - what the whole matching looked like right after
//!
//! # Outcomes
//!
//! - **Accepted**: the school was free and tentatively accepts the proposer
//! - **Rejected**: the school keeps its incumbent
//! - **Displaced**: the school trades its incumbent for the proposer; the
//!   incumbent goes back to the end of the free queue
//!
//! # Example
//!
//! ```rust
//! use stable_match_core_rs::models::{Matching, StepOutcome, StepRecord};
//!
//! let record = StepRecord {
//!     step: 1,
//!     student: "A".to_string(),
//!     school: "X".to_string(),
//!     outcome: StepOutcome::Accepted,
//!     snapshot: Matching::from_pairs([("X", Some("A")), ("Y", None)]),
//! };
//!
//! assert_eq!(record.event_type(), "Accepted");
//! ```

use crate::models::matching::Matching;
use serde::{Deserialize, Serialize};

/// How a school answered a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StepOutcome {
    /// School was unmatched and accepts the proposer
    Accepted,

    /// School prefers its incumbent; nothing changes
    Rejected { incumbent: String },

    /// School prefers the proposer; the incumbent becomes free
    Displaced { displaced: String },
}

impl StepOutcome {
    /// Short name of the outcome
    pub fn kind(&self) -> &'static str {
        match self {
            StepOutcome::Accepted => "Accepted",
            StepOutcome::Rejected { .. } => "Rejected",
            StepOutcome::Displaced { .. } => "Displaced",
        }
    }

    /// Third agent involved, if any (kept incumbent or displaced student)
    pub fn other_student(&self) -> Option<&str> {
        match self {
            StepOutcome::Accepted => None,
            StepOutcome::Rejected { incumbent } => Some(incumbent),
            StepOutcome::Displaced { displaced } => Some(displaced),
        }
    }
}

/// One proposal of the run.
///
/// Steps are numbered from 1 in the order proposals were made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub student: String,
    pub school: String,
    pub outcome: StepOutcome,
    /// Matching state immediately after this step
    pub snapshot: Matching,
}

impl StepRecord {
    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        self.outcome.kind()
    }

    /// True if `student` proposed in this step or was the incumbent involved
    pub fn involves_student(&self, student: &str) -> bool {
        self.student == student || self.outcome.other_student() == Some(student)
    }
}

/// Ordered trace of a run.
///
/// This is a simple wrapper around Vec<StepRecord> with convenience methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTrace {
    steps: Vec<StepRecord>,
}

impl StepTrace {
    /// Create a new empty trace
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub(crate) fn log(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    /// Get the number of steps recorded
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the trace is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Get all steps
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Get a step by its 1-based step number
    pub fn step(&self, step: usize) -> Option<&StepRecord> {
        step.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// Get steps of a specific outcome kind
    pub fn steps_of_type(&self, kind: &str) -> Vec<&StepRecord> {
        self.steps.iter().filter(|s| s.event_type() == kind).collect()
    }

    /// Get steps in which `student` proposed
    pub fn proposals_by(&self, student: &str) -> Vec<&StepRecord> {
        self.steps.iter().filter(|s| s.student == student).collect()
    }

    /// Get steps addressed to `school`
    pub fn proposals_to(&self, school: &str) -> Vec<&StepRecord> {
        self.steps.iter().filter(|s| s.school == school).collect()
    }

    /// Matching after the last step
    pub fn final_snapshot(&self) -> Option<&Matching> {
        self.steps.last().map(|s| &s.snapshot)
    }

    /// Consume the trace
    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }
}

impl IntoIterator for StepTrace {
    type Item = StepRecord;
    type IntoIter = std::vec::IntoIter<StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
