//! Structured observability hooks for academy session events.
//!
//! This module provides:
//! - A session-scoped tracing span via the `SessionSpan` RAII guard
//! - Emission functions for transitions, collaborator calls and rejections
//!
//! Events are emitted at `info!` level, rejections and collaborator
//! failures at `warn!`. Filtering follows `RUST_LOG`.

use tracing::{info, warn};

use crate::academy::{Difficulty, TaskType, ValidationPhase};
use crate::claim::GameId;

/// RAII guard that enters a session-scoped span.
///
/// ```ignore
/// let _span = SessionSpan::enter("5f0c…");
/// // every event below carries session_id
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    pub fn enter(session_id: &str) -> Self {
        let span = tracing::info_span!("academy.session", session_id = %session_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_identity_minted(agent_id: &str) {
    info!(event = "academy.identity_minted", agent_id = %agent_id);
}

pub fn emit_task_performed(
    agent_id: &str,
    task_type: TaskType,
    difficulty: Difficulty,
    reward_delta: i32,
    reputation: u32,
) {
    info!(
        event = "academy.task_performed",
        agent_id = %agent_id,
        task_type = %task_type,
        difficulty = %difficulty,
        reward_delta = reward_delta,
        reputation = reputation,
    );
}

pub fn emit_validation_phase(phase: ValidationPhase) {
    info!(event = "academy.validation_phase", phase = ?phase);
}

pub fn emit_agent_verified(agent_id: &str) {
    info!(event = "academy.agent_verified", agent_id = %agent_id);
}

pub fn emit_quiz_started(session_id: &str) {
    info!(event = "quiz.started", quiz_session = %session_id);
}

/// Emit event: the grader replied to an answer.
pub fn emit_answer_graded(session_id: &str, question_index: u32, done: bool, passed: Option<bool>) {
    info!(
        event = "quiz.answer_graded",
        quiz_session = %session_id,
        question_index = question_index,
        done = done,
        passed = ?passed,
    );
}

pub fn emit_claim_minted(game: GameId, token_id: u64, tx_hash: &str) {
    info!(
        event = "claim.minted",
        game = %game,
        token_id = token_id,
        tx_hash = %tx_hash,
    );
}

/// Emit event: a player action was refused locally (warning level).
pub fn emit_action_rejected(action: &str, reason: &dyn std::fmt::Display) {
    warn!(event = "academy.action_rejected", action = %action, reason = %reason);
}

/// Emit event: a collaborator call failed (warning level).
pub fn emit_collaborator_error(operation: &str, error: &dyn std::fmt::Display) {
    warn!(event = "collaborator.error", operation = %operation, error = %error);
}
