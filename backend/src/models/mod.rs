//! Domain models for the matching engine

pub mod event;
pub mod instance;
pub mod matching;

// Re-exports
pub use event::{StepOutcome, StepRecord, StepTrace};
pub use instance::{Instance, InstanceData, InstanceError, Side};
pub use matching::{Assignment, Matching};
