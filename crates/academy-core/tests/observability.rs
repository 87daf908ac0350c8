//! Observability tests for academy session tracing.
//!
//! Verify that structured events are emitted for the key transitions:
//! identity mint, task results, validation phases, rejections.

use std::sync::Arc;

use academy_core::fakes::{FakeBadgeService, FakeQuizService, RecordingWallet, ScriptedRandom};
use academy_core::obs::{
    emit_action_rejected, emit_answer_graded, emit_claim_minted, emit_collaborator_error,
    emit_task_performed, SessionSpan,
};
use academy_core::{
    AcademyError, AcademySession, Difficulty, GameId, ManualClock, SessionDeps, TaskType,
};
use chrono::Utc;
use tracing_test::traced_test;

fn session() -> AcademySession {
    AcademySession::new(SessionDeps {
        quiz_service: Arc::new(FakeQuizService::new()),
        badge_service: Arc::new(FakeBadgeService::new()),
        wallet: Arc::new(RecordingWallet::disconnected()),
        clock: Arc::new(ManualClock::new(Utc::now())),
        random: Box::new(ScriptedRandom::always(0.1)),
    })
}

#[traced_test]
#[test]
fn test_emit_task_performed_logs_delta() {
    emit_task_performed("0x0A0B0C0D", TaskType::Coding, Difficulty::Medium, 20, 40);
    assert!(logs_contain("academy.task_performed"));
    assert!(logs_contain("reward_delta=20"));
}

#[traced_test]
#[test]
fn test_emit_answer_graded_logs_verdict() {
    emit_answer_graded("sess-1", 2, true, Some(true));
    assert!(logs_contain("quiz.answer_graded"));
    assert!(logs_contain("sess-1"));
}

#[traced_test]
#[test]
fn test_emit_claim_minted_logs_token() {
    emit_claim_minted(GameId::Erc8004, 7, "0xabc");
    assert!(logs_contain("claim.minted"));
    assert!(logs_contain("token_id=7"));
}

#[traced_test]
#[test]
fn test_warn_level_events() {
    emit_action_rejected("perform_task", &AcademyError::WalletNotConnected);
    emit_collaborator_error("start_quiz", &"connection refused");
    assert!(logs_contain("academy.action_rejected"));
    assert!(logs_contain("connection refused"));
}

#[traced_test]
#[test]
fn test_session_span_enter() {
    let span = SessionSpan::enter("span-session");
    drop(span);
}

#[traced_test]
#[test]
fn test_session_emits_progression_events() {
    let mut s = session();
    let agent_id = s.mint_identity().unwrap();
    s.perform_task(TaskType::Box, Difficulty::Easy).unwrap();

    assert!(logs_contain("academy.identity_minted"));
    assert!(logs_contain(&agent_id));
    assert!(logs_contain("academy.task_performed"));
}

#[traced_test]
#[test]
fn test_rejected_hard_task_is_logged() {
    let mut s = session();
    s.mint_identity().unwrap();
    let _ = s.perform_task(TaskType::Coding, Difficulty::Hard);

    assert!(logs_contain("academy.action_rejected"));
    assert!(logs_contain("hard tasks require verified status"));
}

#[traced_test]
#[test]
fn test_validation_phases_are_logged() {
    let mut s = session();
    s.mint_identity().unwrap();
    for _ in 0..5 {
        s.perform_task(TaskType::Delivery, Difficulty::Easy).unwrap();
    }
    s.proceed_to_validation().unwrap();
    s.submit_validation_proof().unwrap();
    s.run_pending_timers();

    assert!(logs_contain("academy.validation_phase"));
    assert!(logs_contain("Stamping"));
    assert!(logs_contain("academy.agent_verified"));
}

#[traced_test]
#[test]
fn test_session_metrics_flush_is_labelled() {
    let s = session();
    s.flush_metrics();

    assert!(logs_contain("metric=\"flush\""));
    assert!(logs_contain(&s.id().to_string()));
    assert!(logs_contain("validations_completed="));
}
