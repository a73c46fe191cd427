//! Matching engine.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Same instance always produces the same matching and trace
//! 2. **Local State**: Free queue and proposal history live inside one run
//! 3. **Synchronous Execution**: Pure computation, no I/O, no async
//! 4. **Tracing Is Data**: The step trace is returned, never pushed to a callback
//!
//! ## Guarantees
//!
//! The student-proposing form returns the stable matching that is best for
//! every student among all stable matchings, and worst for every school.
//! Every (student, school) pair is proposed at most once, so a run makes at
//! most n² proposals.

pub mod deferred_acceptance;

pub use deferred_acceptance::{
    run, solve, solve_preferences, MatchOutcome, MatchingError, TraceMode,
};
