//! Agent Academy session core
//!
//! State machines for the ERC-8004 agent academy: identity mint, reputation
//! tasks and the timed validation pipeline, the tutor-graded challenge, and
//! the badge claim. Collaborators (quiz grader, badge minter, wallet) sit
//! behind traits in [`services`]; HTTP implementations live in
//! `academy-client`.

pub mod academy;
pub mod claim;
pub mod env;
pub mod error;
pub mod fakes;
pub mod metrics;
pub mod narration;
pub mod obs;
pub mod quiz;
pub mod scheduler;
pub mod services;
pub mod session;
pub mod telemetry;

pub use academy::{
    AcademyEvent, AcademyMachine, AgentState, Difficulty, Stage, TaskOutcome, TaskResult,
    TaskType, ValidationPhase, ValidationProgress, REPUTATION_THRESHOLD, TASK_LOG_CAPACITY,
};
pub use claim::{ClaimFlow, ClaimResult, ClaimState, GameId, WalletAddress};
pub use env::{Clock, ManualClock, RandomSource, SeededRandom, SystemClock};
pub use error::{AcademyError, Result, ServiceError, ServiceResult};
pub use narration::{ChatRole, TutorChannel, TutorEntry, TutorPose};
pub use quiz::{QuizMachine, QuizMessage, QuizSession, QuizState, ANSWER_ERROR_MESSAGE};
pub use scheduler::{ManualScheduler, Scheduler, Timer};
pub use services::{AnswerRequest, BadgeService, QuizService, QuizTurn, WalletConnector};
pub use session::{AcademySession, SessionDeps};

/// Academy core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
