//! Collaborator contracts.
//!
//! The session core never talks to the network itself. Quiz grading, badge
//! minting and the wallet are reached through these traits:
//! - `QuizService`: start a graded quiz session and submit answers.
//! - `BadgeService`: mint the achievement badge for a game.
//! - `WalletConnector`: ask the player to connect a wallet.
//!
//! In-memory fakes live in the `fakes` module; the HTTP implementation lives
//! in the `academy-client` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claim::{ClaimResult, GameId, WalletAddress};
use crate::error::ServiceResult;

/// One grader turn, returned by both quiz endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizTurn {
    pub session_id: String,
    pub done: bool,
    #[serde(default)]
    pub question_index: u32,
    pub assistant_message: String,
    /// Unset until the grader finishes the session.
    #[serde(default)]
    pub passed: Option<bool>,
}

impl QuizTurn {
    /// Opening turn of a fresh session.
    pub fn opening(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            done: false,
            question_index: 0,
            assistant_message: message.into(),
            passed: None,
        }
    }

    /// Mid-session reply moving on to `question_index`.
    pub fn next_question(
        session_id: impl Into<String>,
        question_index: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            done: false,
            question_index,
            assistant_message: message.into(),
            passed: None,
        }
    }

    /// Final reply carrying the verdict.
    pub fn finished(session_id: impl Into<String>, message: impl Into<String>, passed: bool) -> Self {
        Self {
            session_id: session_id.into(),
            done: true,
            question_index: 0,
            assistant_message: message.into(),
            passed: Some(passed),
        }
    }
}

/// Body of an answer submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub session_id: String,
    pub answer: String,
}

/// Remote quiz grader.
#[async_trait]
pub trait QuizService: Send + Sync {
    /// Open a new session. Each call yields a fresh session id.
    async fn start_quiz(&self) -> ServiceResult<QuizTurn>;

    /// Grade one answer within an open session.
    async fn submit_answer(&self, request: &AnswerRequest) -> ServiceResult<QuizTurn>;
}

/// Remote badge minter.
#[async_trait]
pub trait BadgeService: Send + Sync {
    async fn claim_badge(&self, game: GameId, address: &WalletAddress) -> ServiceResult<ClaimResult>;
}

/// The player's wallet, as far as the session needs it.
pub trait WalletConnector: Send + Sync {
    /// Connected address, if any.
    fn address(&self) -> Option<WalletAddress>;

    /// Prompt the player to connect a wallet.
    fn request_connection(&self);
}
