//! Agent progression state and its pure transition function.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AcademyError, Result};

/// Reputation needed before the validation stage opens.
pub const REPUTATION_THRESHOLD: u32 = 50;

/// Number of task results kept in the log.
pub const TASK_LOG_CAPACITY: usize = 5;

/// Probability that a task earns its full reward.
pub const POSITIVE_OUTCOME_PROBABILITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Box,
    Delivery,
    Coding,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Box => "box",
            Self::Delivery => "delivery",
            Self::Coding => "coding",
        };
        f.write_str(name)
    }
}

impl FromStr for TaskType {
    type Err = AcademyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(Self::Box),
            "delivery" => Ok(Self::Delivery),
            "coding" => Ok(Self::Coding),
            other => Err(AcademyError::InvalidState(format!("unknown task type: {other}"))),
        }
    }
}

/// Task difficulty tier. The tier fixes the base reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn base_reward(self) -> u32 {
        match self {
            Self::Easy => 10,
            Self::Medium => 20,
            Self::Hard => 50,
        }
    }

    pub fn requires_verification(self) -> bool {
        matches!(self, Self::Hard)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = AcademyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(AcademyError::InvalidState(format!("unknown difficulty: {other}"))),
        }
    }
}

/// Feedback a completed task received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Positive,
    Negative,
}

impl TaskOutcome {
    /// Map a uniform draw in `[0, 1)` to an outcome.
    pub fn from_draw(draw: f64) -> Self {
        if draw < POSITIVE_OUTCOME_PROBABILITY {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    /// Full base reward on success, minus half of it (rounded down) otherwise.
    pub fn reward_delta(self, difficulty: Difficulty) -> i32 {
        let base = difficulty.base_reward() as i32;
        match self {
            Self::Positive => base,
            Self::Negative => -(base / 2),
        }
    }
}

/// One completed task. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_type: TaskType,
    pub difficulty: Difficulty,
    pub reward_delta: i32,
    pub timestamp: DateTime<Utc>,
}

/// Step of the simulated proof pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPhase {
    /// Waiting for the player to submit a proof.
    Idle,
    Submitting,
    Stamping,
    Verified,
}

impl ValidationPhase {
    /// How long the phase lasts before the next timer fires.
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::Idle => None,
            Self::Submitting => Some(Duration::from_secs(2)),
            Self::Stamping => Some(Duration::from_secs(3)),
            Self::Verified => Some(Duration::from_secs(2)),
        }
    }
}

/// Current progression phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Identity,
    Reputation,
    Validation { phase: ValidationPhase },
}

/// Input to [`AgentState::apply`]. Random draws and timestamps are already
/// resolved so the transition itself is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum AcademyEvent {
    IdentityMinted {
        agent_id: String,
    },
    TaskCompleted {
        task_type: TaskType,
        difficulty: Difficulty,
        outcome: TaskOutcome,
        at: DateTime<Utc>,
    },
    ValidationRequested,
    ProofSubmitted,
    ValidationPhaseElapsed,
    Reset,
}

/// The player's progress through the academy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    agent_id: Option<String>,
    reputation: u32,
    is_verified: bool,
    stage: Stage,
    task_log: Vec<TaskResult>,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            agent_id: None,
            reputation: 0,
            is_verified: false,
            stage: Stage::Identity,
            task_log: Vec::new(),
        }
    }
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn reputation(&self) -> u32 {
        self.reputation
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Most recent first, at most [`TASK_LOG_CAPACITY`] entries.
    pub fn task_log(&self) -> &[TaskResult] {
        &self.task_log
    }

    pub fn validation_phase(&self) -> Option<ValidationPhase> {
        match self.stage {
            Stage::Validation { phase } => Some(phase),
            _ => None,
        }
    }

    pub fn can_proceed_to_validation(&self) -> bool {
        self.check_validation_request().is_ok()
    }

    /// Check whether a task of `difficulty` may be performed right now.
    pub fn check_task(&self, difficulty: Difficulty) -> Result<()> {
        if difficulty.requires_verification() && !self.is_verified {
            return Err(AcademyError::PermissionDenied(
                "hard tasks require verified status".into(),
            ));
        }
        if self.stage != Stage::Reputation {
            return Err(AcademyError::InvalidState(format!(
                "tasks can only be performed in the reputation stage (current: {:?})",
                self.stage
            )));
        }
        Ok(())
    }

    fn check_validation_request(&self) -> Result<()> {
        if self.is_verified {
            return Err(AcademyError::PermissionDenied(
                "agent is already verified".into(),
            ));
        }
        if self.reputation < REPUTATION_THRESHOLD {
            return Err(AcademyError::PermissionDenied(format!(
                "validation requires {REPUTATION_THRESHOLD} reputation, agent has {}",
                self.reputation
            )));
        }
        if self.stage != Stage::Reputation {
            return Err(AcademyError::InvalidState(format!(
                "validation can only be requested from the reputation stage (current: {:?})",
                self.stage
            )));
        }
        Ok(())
    }

    /// Apply an event, returning the next state. `self` is never modified,
    /// so a rejected event leaves the caller's state untouched.
    pub fn apply(&self, event: &AcademyEvent) -> Result<AgentState> {
        let mut next = self.clone();
        match event {
            AcademyEvent::IdentityMinted { agent_id } => {
                if let Some(existing) = &self.agent_id {
                    return Err(AcademyError::InvalidState(format!(
                        "identity already minted: {existing}"
                    )));
                }
                next.agent_id = Some(agent_id.clone());
                next.stage = Stage::Reputation;
            }
            AcademyEvent::TaskCompleted {
                task_type,
                difficulty,
                outcome,
                at,
            } => {
                self.check_task(*difficulty)?;
                let delta = outcome.reward_delta(*difficulty);
                let reputation = (i64::from(self.reputation) + i64::from(delta)).max(0);
                next.reputation = u32::try_from(reputation).unwrap_or(u32::MAX);
                next.task_log.insert(
                    0,
                    TaskResult {
                        task_type: *task_type,
                        difficulty: *difficulty,
                        reward_delta: delta,
                        timestamp: *at,
                    },
                );
                next.task_log.truncate(TASK_LOG_CAPACITY);
            }
            AcademyEvent::ValidationRequested => {
                self.check_validation_request()?;
                next.stage = Stage::Validation {
                    phase: ValidationPhase::Idle,
                };
            }
            AcademyEvent::ProofSubmitted => match self.stage {
                Stage::Validation {
                    phase: ValidationPhase::Idle,
                } => {
                    next.stage = Stage::Validation {
                        phase: ValidationPhase::Submitting,
                    };
                }
                other => {
                    return Err(AcademyError::InvalidState(format!(
                        "no proof can be submitted in {other:?}"
                    )))
                }
            },
            AcademyEvent::ValidationPhaseElapsed => {
                let phase = self.validation_phase().ok_or_else(|| {
                    AcademyError::InvalidState("validation pipeline is not running".into())
                })?;
                match phase {
                    ValidationPhase::Idle => {
                        return Err(AcademyError::InvalidState(
                            "validation pipeline is not running".into(),
                        ))
                    }
                    ValidationPhase::Submitting => {
                        next.stage = Stage::Validation {
                            phase: ValidationPhase::Stamping,
                        };
                    }
                    ValidationPhase::Stamping => {
                        next.stage = Stage::Validation {
                            phase: ValidationPhase::Verified,
                        };
                    }
                    ValidationPhase::Verified => {
                        next.is_verified = true;
                        next.stage = Stage::Reputation;
                    }
                }
            }
            AcademyEvent::Reset => return Ok(AgentState::default()),
        }
        Ok(next)
    }
}
