//! Driver for the progression state: resolves randomness and time, then
//! applies events through [`AgentState::apply`].

use std::sync::Arc;

use tracing::debug;

use super::state::{
    AcademyEvent, AgentState, Difficulty, TaskOutcome, TaskResult, TaskType, ValidationPhase,
};
use crate::env::{Clock, RandomSource};
use crate::error::{AcademyError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::scheduler::{Scheduler, Timer};

/// Where the validation pipeline stands after a timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationProgress {
    /// Entered the given phase; another timer is pending.
    Phase(ValidationPhase),
    /// The agent is now verified.
    Completed,
}

pub struct AcademyMachine {
    state: AgentState,
    clock: Arc<dyn Clock>,
    random: Box<dyn RandomSource>,
}

impl AcademyMachine {
    pub fn new(clock: Arc<dyn Clock>, random: Box<dyn RandomSource>) -> Self {
        Self {
            state: AgentState::default(),
            clock,
            random,
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    fn apply(&mut self, event: AcademyEvent) -> Result<()> {
        self.state = self.state.apply(&event)?;
        Ok(())
    }

    /// Mint the agent identity: `0x` followed by eight upper-case hex digits.
    pub fn mint_identity(&mut self) -> Result<String> {
        if let Some(existing) = self.state.agent_id() {
            return Err(AcademyError::InvalidState(format!(
                "identity already minted: {existing}"
            )));
        }
        let mut bytes = [0u8; 4];
        self.random.fill_bytes(&mut bytes);
        let agent_id = format!("0x{}", hex::encode_upper(bytes));

        self.apply(AcademyEvent::IdentityMinted {
            agent_id: agent_id.clone(),
        })?;
        obs::emit_identity_minted(&agent_id);
        Ok(agent_id)
    }

    /// Perform a task and apply its randomly drawn outcome.
    ///
    /// A rejected task consumes no random draw and leaves the state alone.
    pub fn perform_task(&mut self, task_type: TaskType, difficulty: Difficulty) -> Result<TaskResult> {
        if let Err(err) = self.state.check_task(difficulty) {
            obs::emit_action_rejected("perform_task", &err);
            return Err(err);
        }

        let outcome = TaskOutcome::from_draw(self.random.next_unit());
        self.apply(AcademyEvent::TaskCompleted {
            task_type,
            difficulty,
            outcome,
            at: self.clock.now(),
        })?;
        METRICS.inc_tasks_performed();

        let result = self.state.task_log()[0].clone();
        obs::emit_task_performed(
            self.state.agent_id().unwrap_or_default(),
            task_type,
            difficulty,
            result.reward_delta,
            self.state.reputation(),
        );
        Ok(result)
    }

    pub fn proceed_to_validation(&mut self) -> Result<()> {
        self.apply(AcademyEvent::ValidationRequested)
            .inspect_err(|err| obs::emit_action_rejected("proceed_to_validation", err))?;
        obs::emit_validation_phase(ValidationPhase::Idle);
        Ok(())
    }

    /// Start the timed proof pipeline. Phases advance through
    /// [`AcademyMachine::on_timer`].
    pub fn submit_validation_proof(&mut self, scheduler: &mut dyn Scheduler) -> Result<()> {
        self.apply(AcademyEvent::ProofSubmitted)
            .inspect_err(|err| obs::emit_action_rejected("submit_validation_proof", err))?;
        self.schedule_current_phase(scheduler);
        obs::emit_validation_phase(ValidationPhase::Submitting);
        Ok(())
    }

    /// React to a fired timer. Timers that no longer match the state
    /// (e.g. after a reset) are ignored and yield `None`.
    pub fn on_timer(
        &mut self,
        timer: Timer,
        scheduler: &mut dyn Scheduler,
    ) -> Option<ValidationProgress> {
        match timer {
            Timer::ValidationPhaseElapsed => {
                if let Err(err) = self.apply(AcademyEvent::ValidationPhaseElapsed) {
                    debug!(error = %err, "ignoring stale validation timer");
                    return None;
                }
                match self.state.validation_phase() {
                    Some(phase) => {
                        self.schedule_current_phase(scheduler);
                        obs::emit_validation_phase(phase);
                        Some(ValidationProgress::Phase(phase))
                    }
                    None => {
                        METRICS.inc_validations_completed();
                        obs::emit_agent_verified(self.state.agent_id().unwrap_or_default());
                        Some(ValidationProgress::Completed)
                    }
                }
            }
        }
    }

    fn schedule_current_phase(&self, scheduler: &mut dyn Scheduler) {
        if let Some(delay) = self
            .state
            .validation_phase()
            .and_then(ValidationPhase::duration)
        {
            scheduler.schedule(delay, Timer::ValidationPhaseElapsed);
        }
    }

    /// Back to the initial state; pending timers are cancelled.
    pub fn reset(&mut self, scheduler: &mut dyn Scheduler) {
        scheduler.cancel_all();
        self.state = AgentState::default();
    }
}
