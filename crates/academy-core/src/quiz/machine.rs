//! Drives a [`QuizState`] against a remote [`QuizService`].

use std::sync::Arc;

use super::state::{QuizEvent, QuizSession, QuizState};
use crate::error::{AcademyError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::services::{AnswerRequest, QuizService};

pub struct QuizMachine {
    state: QuizState,
    service: Arc<dyn QuizService>,
    /// Set by the first passed session. Survives `close`, cleared by `reset`.
    passed: bool,
}

impl QuizMachine {
    pub fn new(service: Arc<dyn QuizService>) -> Self {
        Self {
            state: QuizState::Idle,
            service,
            passed: false,
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.state.session()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.in_flight()
    }

    /// True once the grader finished a session with a pass.
    pub fn passed(&self) -> bool {
        self.passed
    }

    fn apply(&mut self, event: QuizEvent) -> Result<()> {
        self.state = self.state.apply(&event)?;
        if matches!(&self.state, QuizState::Finished(s) if s.is_passed()) {
            self.passed = true;
        }
        Ok(())
    }

    fn open_session(&self) -> Result<QuizSession> {
        self.state
            .session()
            .cloned()
            .ok_or_else(|| AcademyError::InvalidState("no quiz session is open".into()))
    }

    /// Open a new graded session. Only a verified agent may take the challenge.
    ///
    /// On failure no session exists afterwards.
    pub async fn start_challenge(&mut self, verified: bool) -> Result<QuizSession> {
        if !verified {
            let err = AcademyError::PermissionDenied(
                "the challenge unlocks after validation".into(),
            );
            obs::emit_action_rejected("start_challenge", &err);
            return Err(err);
        }
        if self.passed {
            let err = AcademyError::InvalidState("the challenge is already passed".into());
            obs::emit_action_rejected("start_challenge", &err);
            return Err(err);
        }
        self.apply(QuizEvent::StartRequested)?;

        match self.service.start_quiz().await {
            Ok(turn) => {
                self.apply(QuizEvent::Started(turn))?;
                let session = self.open_session()?;
                obs::emit_quiz_started(&session.session_id);
                Ok(session)
            }
            Err(err) => {
                METRICS.inc_collaborator_failures();
                obs::emit_collaborator_error("start_quiz", &err);
                self.apply(QuizEvent::StartFailed)?;
                Err(err.into())
            }
        }
    }

    /// Submit one answer. The user line is recorded before the grader is
    /// called and stays in the transcript whatever the outcome.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<QuizSession> {
        self.apply(QuizEvent::AnswerSubmitted(answer.to_string()))?;
        let session_id = self.open_session()?.session_id;
        METRICS.inc_answers_submitted();

        let request = AnswerRequest {
            session_id: session_id.clone(),
            answer: answer.to_string(),
        };
        match self.service.submit_answer(&request).await {
            Ok(turn) => {
                self.apply(QuizEvent::Replied(turn))?;
                let session = self.open_session()?;
                obs::emit_answer_graded(&session_id, session.question_index, session.done, session.passed);
                Ok(session)
            }
            Err(err) => {
                METRICS.inc_collaborator_failures();
                obs::emit_collaborator_error("submit_answer", &err);
                self.apply(QuizEvent::ReplyFailed)?;
                Err(err.into())
            }
        }
    }

    /// Discard a failed session and open a brand-new one.
    ///
    /// A grader that hands back the discarded session id is treated as a
    /// collaborator failure and leaves no session open.
    pub async fn retry(&mut self, verified: bool) -> Result<QuizSession> {
        let previous = match &self.state {
            QuizState::Finished(session) if !session.is_passed() => session.session_id.clone(),
            QuizState::Finished(_) => {
                return Err(AcademyError::InvalidState(
                    "the challenge is already passed".into(),
                ))
            }
            _ => {
                return Err(AcademyError::InvalidState(
                    "retry is only possible after a failed attempt".into(),
                ))
            }
        };
        self.apply(QuizEvent::Closed)?;
        let session = self.start_challenge(verified).await?;

        if session.session_id == previous {
            let err = AcademyError::NetworkFailure(format!(
                "the grader reused session id {previous}"
            ));
            METRICS.inc_collaborator_failures();
            obs::emit_collaborator_error("start_quiz", &err);
            self.apply(QuizEvent::Closed)?;
            return Err(err);
        }
        Ok(session)
    }

    /// Dismiss the quiz, discarding any session. A pass is kept.
    pub fn close(&mut self) {
        self.state = QuizState::Idle;
    }

    /// Forget the session and the pass.
    pub fn reset(&mut self) {
        self.state = QuizState::Idle;
        self.passed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::fakes::FakeQuizService;
    use crate::services::QuizTurn;

    #[tokio::test]
    async fn test_unverified_start_makes_no_call() {
        let service = Arc::new(FakeQuizService::new());
        let mut quiz = QuizMachine::new(service.clone());
        let err = quiz.start_challenge(false).await.unwrap_err();
        assert!(matches!(err, AcademyError::PermissionDenied(_)));
        assert_eq!(service.start_calls(), 0);
        assert_eq!(quiz.state(), &QuizState::Idle);
    }

    #[tokio::test]
    async fn test_start_failure_rolls_back() {
        let service = Arc::new(FakeQuizService::new());
        service.push_start(Err(ServiceError::Transport("connection refused".into())));
        let mut quiz = QuizMachine::new(service.clone());

        let err = quiz.start_challenge(true).await.unwrap_err();
        assert_eq!(
            err,
            AcademyError::NetworkFailure("request failed: connection refused".into())
        );
        assert_eq!(quiz.state(), &QuizState::Idle);
        assert!(!quiz.is_submitting());
    }

    #[tokio::test]
    async fn test_answer_loop_until_pass() {
        let service = Arc::new(FakeQuizService::new());
        service.push_start(Ok(QuizTurn::opening("s1", "Q1")));
        service.push_answer(Ok(QuizTurn::next_question("s1", 1, "Q2")));
        service.push_answer(Ok(QuizTurn::finished("s1", "Passed!", true)));
        let mut quiz = QuizMachine::new(service.clone());

        quiz.start_challenge(true).await.unwrap();
        quiz.submit_answer("a1").await.unwrap();
        assert!(!quiz.passed());
        let session = quiz.submit_answer("a2").await.unwrap();
        assert!(session.done);
        assert!(quiz.passed());
        assert_eq!(session.messages.len(), 5);

        let requests = service.answer_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.session_id == "s1"));
    }

    #[tokio::test]
    async fn test_empty_answer_makes_no_call() {
        let service = Arc::new(FakeQuizService::new());
        let mut quiz = QuizMachine::new(service.clone());
        quiz.start_challenge(true).await.unwrap();
        assert_eq!(quiz.submit_answer("").await, Err(AcademyError::EmptyAnswer));
        assert!(service.answer_requests().is_empty());
    }

    #[tokio::test]
    async fn test_retry_requires_failed_attempt() {
        let service = Arc::new(FakeQuizService::new());
        let mut quiz = QuizMachine::new(service.clone());
        quiz.start_challenge(true).await.unwrap();
        let err = quiz.retry(true).await.unwrap_err();
        assert!(matches!(err, AcademyError::InvalidState(_)));
        assert_eq!(service.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_pass_survives_close_until_reset() {
        let service = Arc::new(FakeQuizService::new());
        service.push_start(Ok(QuizTurn::opening("s1", "Q1")));
        service.push_answer(Ok(QuizTurn::finished("s1", "Passed!", true)));
        let mut quiz = QuizMachine::new(service.clone());
        quiz.start_challenge(true).await.unwrap();
        quiz.submit_answer("a1").await.unwrap();

        quiz.close();
        assert!(quiz.passed());
        assert_eq!(quiz.state(), &QuizState::Idle);
        let err = quiz.start_challenge(true).await.unwrap_err();
        assert!(matches!(err, AcademyError::InvalidState(_)));
        assert_eq!(service.start_calls(), 1);

        quiz.reset();
        assert!(!quiz.passed());
        quiz.start_challenge(true).await.unwrap();
        assert_eq!(service.start_calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_rejects_reused_session_id() {
        let service = Arc::new(FakeQuizService::new());
        service.push_start(Ok(QuizTurn::opening("s1", "Q1")));
        service.push_answer(Ok(QuizTurn::finished("s1", "Failed.", false)));
        service.push_start(Ok(QuizTurn::opening("s1", "Q1 again")));
        let mut quiz = QuizMachine::new(service.clone());
        quiz.start_challenge(true).await.unwrap();
        quiz.submit_answer("a1").await.unwrap();

        let err = quiz.retry(true).await.unwrap_err();
        assert!(matches!(err, AcademyError::NetworkFailure(_)));
        assert_eq!(quiz.state(), &QuizState::Idle);
        assert_eq!(service.start_calls(), 2);
    }
}
