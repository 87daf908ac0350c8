//! Academy progression: identity mint, reputation tasks, validation.
//!
//! [`AgentState`] is a plain value with a pure `apply` transition;
//! [`AcademyMachine`] owns one and feeds it events built from the injected
//! clock and random source.

pub mod machine;
pub mod state;

pub use machine::{AcademyMachine, ValidationProgress};
pub use state::{
    AcademyEvent, AgentState, Difficulty, Stage, TaskOutcome, TaskResult, TaskType,
    ValidationPhase, POSITIVE_OUTCOME_PROBABILITY, REPUTATION_THRESHOLD, TASK_LOG_CAPACITY,
};
