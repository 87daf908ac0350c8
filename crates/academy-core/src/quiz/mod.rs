//! Quiz session sub-machine: a turn-based exchange with the remote grader.

pub mod machine;
pub mod state;

pub use machine::QuizMachine;
pub use state::{QuizEvent, QuizMessage, QuizSession, QuizState, ANSWER_ERROR_MESSAGE};
