//! Deferred acceptance, student-proposing form.
//!
//! # Loop
//!
//! ```text
//! free = all students, in instance order
//! while free is not empty:
//!   s = front of free
//!   e = first school in s's list that s has not proposed to yet
//!   record e in s's proposal history
//!   if e is unmatched:               accept, s leaves free
//!   elif e ranks s above incumbent:  displace, s leaves free,
//!                                    incumbent appended to back of free
//!   else:                            reject, s stays at the front
//! ```
//!
//! # Determinism
//!
//! The free queue is strict FIFO over instance order. A displaced incumbent
//! is always appended to the back, never re-inserted in the middle. A
//! rejected student stays at the front and proposes again immediately.

use crate::models::event::{StepOutcome, StepRecord, StepTrace};
use crate::models::instance::{Instance, InstanceError};
use crate::models::matching::Matching;
use std::collections::VecDeque;
use thiserror::Error;

/// Matching engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    /// Preference data violated an instance invariant; no matching state
    /// was created
    #[error("Invalid instance: {0}")]
    InvalidInstance(#[from] InstanceError),

    /// A free student ran out of schools to propose to. Unreachable with
    /// complete preference lists; reported instead of dropping the student.
    #[error("Student {student} exhausted its preference list while still free")]
    PreferencesExhausted { student: String },
}

/// Whether the engine records a step trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceMode {
    /// Bulk mode: only the final matching is produced
    #[default]
    Disabled,
    /// Record one [`StepRecord`] per proposal
    Enabled,
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Final matching (total and bijective)
    pub matching: Matching,

    /// Step trace, present only with [`TraceMode::Enabled`]
    pub trace: Option<StepTrace>,

    /// Number of proposals made; never exceeds n²
    pub proposals: usize,
}

/// Mutable state of a single run.
///
/// Owned by one `run` call and dropped with it; nothing is shared between
/// runs.
struct ProposalState {
    /// Students without a school, front = next to propose
    free: VecDeque<usize>,

    /// Schools each student has proposed to, in proposal order
    history: Vec<Vec<usize>>,

    /// engaged[school] = student currently held
    engaged: Vec<Option<usize>>,
}

impl ProposalState {
    fn new(n: usize) -> Self {
        Self {
            free: (0..n).collect(),
            history: vec![Vec::new(); n],
            engaged: vec![None; n],
        }
    }

    /// First school in `student`'s list not yet proposed to.
    ///
    /// Students propose strictly in list order, so the history is always a
    /// prefix of the list and the candidate sits right after it.
    fn next_candidate(&self, instance: &Instance, student: usize) -> Option<usize> {
        let history = &self.history[student];
        let prefs = instance.student_pref_indices(student);
        debug_assert!(prefs.starts_with(history));
        prefs.get(history.len()).copied()
    }
}

/// Index-level outcome, converted to names only when tracing
enum Response {
    Accepted,
    Rejected(usize),
    Displaced(usize),
}

/// Run deferred acceptance on `instance`.
///
/// # Errors
///
/// * `MatchingError::PreferencesExhausted` - internal invariant failure;
///   no matching is returned
///
/// # Example
///
/// ```rust
/// use stable_match_core_rs::engine::{run, TraceMode};
/// use stable_match_core_rs::Instance;
///
/// let instance = Instance::from_rows(
///     [("A", ["X", "Y"]), ("B", ["X", "Y"])],
///     [("X", ["B", "A"]), ("Y", ["A", "B"])],
/// )
/// .unwrap();
///
/// let outcome = run(&instance, TraceMode::Enabled).unwrap();
/// assert_eq!(outcome.matching.student_for("X"), Some("B"));
/// assert_eq!(outcome.trace.unwrap().len(), 3);
/// ```
pub fn run(instance: &Instance, mode: TraceMode) -> Result<MatchOutcome, MatchingError> {
    let mut state = ProposalState::new(instance.len());
    let mut trace = match mode {
        TraceMode::Enabled => Some(StepTrace::new()),
        TraceMode::Disabled => None,
    };
    let mut proposals = 0;

    while let Some(&student) = state.free.front() {
        let Some(school) = state.next_candidate(instance, student) else {
            return Err(MatchingError::PreferencesExhausted {
                student: instance.student_id(student).to_string(),
            });
        };

        state.history[student].push(school);
        proposals += 1;

        let current = state.engaged[school];
        let response = match current {
            None => {
                state.engaged[school] = Some(student);
                state.free.pop_front();
                Response::Accepted
            }
            Some(incumbent)
                if instance.school_rank(school, student) < instance.school_rank(school, incumbent) =>
            {
                state.engaged[school] = Some(student);
                state.free.pop_front();
                state.free.push_back(incumbent);
                Response::Displaced(incumbent)
            }
            Some(incumbent) => Response::Rejected(incumbent),
        };

        if let Some(trace) = trace.as_mut() {
            let outcome = match response {
                Response::Accepted => StepOutcome::Accepted,
                Response::Rejected(incumbent) => StepOutcome::Rejected {
                    incumbent: instance.student_id(incumbent).to_string(),
                },
                Response::Displaced(displaced) => StepOutcome::Displaced {
                    displaced: instance.student_id(displaced).to_string(),
                },
            };
            trace.log(StepRecord {
                step: proposals,
                student: instance.student_id(student).to_string(),
                school: instance.school_id(school).to_string(),
                outcome,
                snapshot: Matching::from_engaged(instance, &state.engaged),
            });
        }
    }

    Ok(MatchOutcome {
        matching: Matching::from_engaged(instance, &state.engaged),
        trace,
        proposals,
    })
}

/// Run with tracing disabled and return only the matching
pub fn solve(instance: &Instance) -> Result<Matching, MatchingError> {
    run(instance, TraceMode::Disabled).map(|outcome| outcome.matching)
}

/// Validate raw preference rows, then run.
///
/// Rows are `(agent, preferences)` in the order agents should be served.
/// A precondition violation is reported as
/// [`MatchingError::InvalidInstance`] before any matching state exists.
pub fn solve_preferences(
    student_rows: Vec<(String, Vec<String>)>,
    school_rows: Vec<(String, Vec<String>)>,
    mode: TraceMode,
) -> Result<MatchOutcome, MatchingError> {
    let instance = Instance::from_rows(student_rows, school_rows)?;
    run(&instance, mode)
}
