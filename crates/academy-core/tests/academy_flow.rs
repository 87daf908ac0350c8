//! End-to-end progression through an `AcademySession` backed by fakes:
//! identity, reputation, the timed validation pipeline, and reset.

use std::sync::Arc;
use std::time::Duration;

use academy_core::fakes::{FakeBadgeService, FakeQuizService, RecordingWallet, ScriptedRandom};
use academy_core::{
    AcademyError, AcademySession, Difficulty, ManualClock, SessionDeps, Stage, TaskType,
    TutorPose, ValidationPhase, REPUTATION_THRESHOLD, TASK_LOG_CAPACITY,
};
use chrono::Utc;

fn session_with(random: ScriptedRandom) -> AcademySession {
    AcademySession::new(SessionDeps {
        quiz_service: Arc::new(FakeQuizService::new()),
        badge_service: Arc::new(FakeBadgeService::new()),
        wallet: Arc::new(RecordingWallet::disconnected()),
        clock: Arc::new(ManualClock::new(Utc::now())),
        random: Box::new(random),
    })
}

/// Mint, then reach the threshold with five positive easy tasks.
fn session_at_threshold() -> AcademySession {
    let mut session = session_with(ScriptedRandom::always(0.1));
    session.mint_identity().unwrap();
    for _ in 0..5 {
        session.perform_task(TaskType::Box, Difficulty::Easy).unwrap();
    }
    session
}

#[test]
fn new_session_greets_in_identity_stage() {
    let session = session_with(ScriptedRandom::always(0.1));
    assert_eq!(session.agent().stage(), Stage::Identity);
    assert_eq!(session.agent().reputation(), 0);
    assert!(!session.agent().is_verified());
    assert_eq!(session.tutor().entries().len(), 1);
    assert_eq!(session.tutor().pose(), TutorPose::Standing);
}

#[test]
fn mint_identity_moves_to_reputation() {
    let mut session = session_with(ScriptedRandom::always(0.1));
    let agent_id = session.mint_identity().unwrap();

    assert!(agent_id.starts_with("0x"));
    assert_eq!(agent_id.len(), 10);
    assert!(agent_id[2..]
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    assert_eq!(session.agent().agent_id(), Some(agent_id.as_str()));
    assert_eq!(session.agent().stage(), Stage::Reputation);
}

#[test]
fn second_mint_is_rejected() {
    let mut session = session_with(ScriptedRandom::always(0.1));
    session.mint_identity().unwrap();
    let err = session.mint_identity().unwrap_err();
    assert!(matches!(err, AcademyError::InvalidState(_)));
}

#[test]
fn five_easy_successes_unlock_validation() {
    let mut session = session_with(ScriptedRandom::always(0.1));
    session.mint_identity().unwrap();

    for _ in 0..4 {
        session.perform_task(TaskType::Delivery, Difficulty::Easy).unwrap();
        assert!(!session.agent().can_proceed_to_validation());
    }
    let before = session.tutor().next_seq();
    session.perform_task(TaskType::Delivery, Difficulty::Easy).unwrap();

    assert_eq!(session.agent().reputation(), REPUTATION_THRESHOLD);
    assert!(session.agent().can_proceed_to_validation());
    // Result line plus the threshold announcement.
    assert_eq!(session.tutor().entries_since(before).len(), 2);
}

#[test]
fn hard_task_before_verification_is_denied_and_narrated() {
    let mut session = session_with(ScriptedRandom::always(0.1));
    session.mint_identity().unwrap();
    let before = session.tutor().next_seq();

    let err = session.perform_task(TaskType::Coding, Difficulty::Hard).unwrap_err();

    assert!(matches!(err, AcademyError::PermissionDenied(_)));
    assert_eq!(session.agent().reputation(), 0);
    assert!(session.agent().task_log().is_empty());
    assert_eq!(session.tutor().entries_since(before).len(), 1);
}

#[test]
fn negative_outcome_subtracts_half_and_floors_at_zero() {
    let mut session = session_with(ScriptedRandom::sequence([0.1, 0.95, 0.95]));
    session.mint_identity().unwrap();

    let first = session.perform_task(TaskType::Box, Difficulty::Medium).unwrap();
    assert_eq!(first.reward_delta, 20);

    let second = session.perform_task(TaskType::Box, Difficulty::Medium).unwrap();
    assert_eq!(second.reward_delta, -10);
    assert_eq!(session.agent().reputation(), 10);

    let third = session.perform_task(TaskType::Box, Difficulty::Medium).unwrap();
    assert_eq!(third.reward_delta, -10);
    assert_eq!(session.agent().reputation(), 0);
}

#[test]
fn task_log_keeps_newest_five() {
    let mut session = session_with(ScriptedRandom::always(0.1));
    session.mint_identity().unwrap();
    let kinds = [
        TaskType::Box,
        TaskType::Delivery,
        TaskType::Coding,
        TaskType::Box,
        TaskType::Delivery,
        TaskType::Coding,
        TaskType::Coding,
    ];
    for kind in kinds {
        session.perform_task(kind, Difficulty::Easy).unwrap();
    }

    let log = session.agent().task_log();
    assert_eq!(log.len(), TASK_LOG_CAPACITY);
    assert_eq!(log[0].task_type, TaskType::Coding);
    assert_eq!(log[1].task_type, TaskType::Coding);
    assert_eq!(log[2].task_type, TaskType::Delivery);
    assert_eq!(session.agent().reputation(), 70);
}

#[test]
fn validation_pipeline_runs_on_virtual_time() {
    let mut session = session_at_threshold();
    session.proceed_to_validation().unwrap();
    assert_eq!(
        session.agent().validation_phase(),
        Some(ValidationPhase::Idle)
    );
    assert!(session.next_timer_delay().is_none());

    session.submit_validation_proof().unwrap();
    assert_eq!(
        session.agent().validation_phase(),
        Some(ValidationPhase::Submitting)
    );
    assert_eq!(session.next_timer_delay(), Some(Duration::from_secs(2)));

    session.advance_time(Duration::from_millis(1999));
    assert_eq!(
        session.agent().validation_phase(),
        Some(ValidationPhase::Submitting)
    );

    session.advance_time(Duration::from_millis(1));
    assert_eq!(
        session.agent().validation_phase(),
        Some(ValidationPhase::Stamping)
    );

    session.advance_time(Duration::from_secs(3));
    assert_eq!(
        session.agent().validation_phase(),
        Some(ValidationPhase::Verified)
    );
    assert!(!session.agent().is_verified());

    session.advance_time(Duration::from_secs(2));
    assert!(session.agent().is_verified());
    assert_eq!(session.agent().stage(), Stage::Reputation);
    assert!(session.next_timer_delay().is_none());
    assert!(session.challenge_unlocked());
}

#[test]
fn one_large_advance_completes_the_pipeline() {
    let mut session = session_at_threshold();
    session.proceed_to_validation().unwrap();
    session.submit_validation_proof().unwrap();

    session.advance_time(Duration::from_secs(60));

    assert!(session.agent().is_verified());
    assert_eq!(session.agent().stage(), Stage::Reputation);
}

#[test]
fn verified_agent_may_do_hard_tasks_but_not_revalidate() {
    let mut session = session_at_threshold();
    session.proceed_to_validation().unwrap();
    session.submit_validation_proof().unwrap();
    session.run_pending_timers();

    let result = session.perform_task(TaskType::Coding, Difficulty::Hard).unwrap();
    assert_eq!(result.reward_delta, 50);
    assert_eq!(session.agent().reputation(), 100);

    let err = session.proceed_to_validation().unwrap_err();
    assert!(matches!(err, AcademyError::PermissionDenied(_)));
}

#[test]
fn tasks_are_refused_during_validation() {
    let mut session = session_at_threshold();
    session.proceed_to_validation().unwrap();

    let err = session.perform_task(TaskType::Box, Difficulty::Easy).unwrap_err();
    assert!(matches!(err, AcademyError::InvalidState(_)));
}

#[test]
fn proof_cannot_be_submitted_twice() {
    let mut session = session_at_threshold();
    session.proceed_to_validation().unwrap();
    session.submit_validation_proof().unwrap();

    let err = session.submit_validation_proof().unwrap_err();
    assert!(matches!(err, AcademyError::InvalidState(_)));
}

#[test]
fn reset_mid_pipeline_cancels_timers() {
    let mut session = session_at_threshold();
    session.proceed_to_validation().unwrap();
    session.submit_validation_proof().unwrap();
    session.advance_time(Duration::from_secs(3));

    session.reset();

    assert_eq!(session.agent().stage(), Stage::Identity);
    assert_eq!(session.agent().reputation(), 0);
    assert!(session.agent().agent_id().is_none());
    assert!(session.next_timer_delay().is_none());
    assert_eq!(session.tutor().entries().len(), 1);

    session.advance_time(Duration::from_secs(60));
    assert_eq!(session.agent().stage(), Stage::Identity);
}
