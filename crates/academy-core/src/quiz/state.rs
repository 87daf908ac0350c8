//! Quiz session state and its pure transition function.

use serde::{Deserialize, Serialize};

use crate::error::{AcademyError, Result};
use crate::narration::ChatRole;
use crate::services::QuizTurn;

/// Tutor line appended when an answer could not be graded.
pub const ANSWER_ERROR_MESSAGE: &str = "Error processing your answer. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizMessage {
    pub role: ChatRole,
    pub text: String,
}

impl QuizMessage {
    pub fn tutor(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tutor,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }
}

/// One attempt at the knowledge challenge, identified by the grader's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    pub session_id: String,
    /// Append-only transcript.
    pub messages: Vec<QuizMessage>,
    pub question_index: u32,
    pub done: bool,
    pub passed: Option<bool>,
}

impl QuizSession {
    fn from_opening(turn: &QuizTurn) -> Self {
        let mut session = Self {
            session_id: turn.session_id.clone(),
            messages: Vec::new(),
            question_index: 0,
            done: false,
            passed: None,
        };
        session.absorb(turn);
        session
    }

    fn absorb(&mut self, turn: &QuizTurn) {
        self.messages.push(QuizMessage::tutor(&turn.assistant_message));
        self.question_index = turn.question_index;
        if turn.done {
            self.done = true;
            self.passed = turn.passed;
        }
    }

    /// A finished session without an explicit verdict counts as failed.
    pub fn is_passed(&self) -> bool {
        self.done && self.passed == Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuizState {
    #[default]
    Idle,
    /// Waiting for the grader to open a session.
    Starting,
    /// Open and accepting answers.
    Active(QuizSession),
    /// An answer is with the grader; its user line is already in the transcript.
    Submitting(QuizSession),
    Finished(QuizSession),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    StartRequested,
    Started(QuizTurn),
    StartFailed,
    AnswerSubmitted(String),
    Replied(QuizTurn),
    ReplyFailed,
    Closed,
}

impl QuizState {
    pub fn session(&self) -> Option<&QuizSession> {
        match self {
            Self::Active(s) | Self::Submitting(s) | Self::Finished(s) => Some(s),
            Self::Idle | Self::Starting => None,
        }
    }

    pub fn in_flight(&self) -> bool {
        matches!(self, Self::Starting | Self::Submitting(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active(_) => "active",
            Self::Submitting(_) => "submitting",
            Self::Finished(_) => "finished",
        }
    }

    fn unexpected(&self, event: &QuizEvent) -> AcademyError {
        AcademyError::InvalidState(format!("quiz is {} and cannot take {event:?}", self.name()))
    }

    /// Apply an event, returning the next state. `self` is never modified.
    pub fn apply(&self, event: &QuizEvent) -> Result<QuizState> {
        match (self, event) {
            (Self::Starting | Self::Submitting(_), QuizEvent::StartRequested)
            | (Self::Starting | Self::Submitting(_), QuizEvent::AnswerSubmitted(_)) => {
                Err(AcademyError::SubmissionInFlight)
            }
            (Self::Idle, QuizEvent::StartRequested) => Ok(Self::Starting),
            (Self::Active(_) | Self::Finished(_), QuizEvent::StartRequested) => Err(
                AcademyError::InvalidState("a quiz session is already open".into()),
            ),

            (Self::Starting, QuizEvent::Started(turn)) => {
                let session = QuizSession::from_opening(turn);
                Ok(if session.done {
                    Self::Finished(session)
                } else {
                    Self::Active(session)
                })
            }
            (Self::Starting, QuizEvent::StartFailed) => Ok(Self::Idle),

            (Self::Active(session), QuizEvent::AnswerSubmitted(answer)) => {
                if answer.trim().is_empty() {
                    return Err(AcademyError::EmptyAnswer);
                }
                let mut session = session.clone();
                session.messages.push(QuizMessage::user(answer));
                Ok(Self::Submitting(session))
            }
            (Self::Finished(_), QuizEvent::AnswerSubmitted(_)) => {
                Err(AcademyError::SessionFinished)
            }
            (Self::Idle, QuizEvent::AnswerSubmitted(_)) => Err(AcademyError::InvalidState(
                "no quiz session is open".into(),
            )),

            (Self::Submitting(session), QuizEvent::Replied(turn)) => {
                let mut session = session.clone();
                session.absorb(turn);
                Ok(if session.done {
                    Self::Finished(session)
                } else {
                    Self::Active(session)
                })
            }
            (Self::Submitting(session), QuizEvent::ReplyFailed) => {
                let mut session = session.clone();
                session.messages.push(QuizMessage::tutor(ANSWER_ERROR_MESSAGE));
                Ok(Self::Active(session))
            }

            (_, QuizEvent::Closed) => Ok(Self::Idle),

            (state, event) => Err(state.unexpected(event)),
        }
    }
}
