//! One player's run through the academy.
//!
//! [`AcademySession`] wires the progression machine, the quiz machine, the
//! claim flow and the tutor channel together. It owns the virtual-time
//! scheduler for the validation pipeline and narrates every transition.
//! The machines share exactly one fact: the quiz and the claim read whether
//! the agent is verified / the quiz is passed.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::academy::{
    AcademyMachine, AgentState, Difficulty, TaskResult, TaskType, ValidationPhase,
    ValidationProgress, REPUTATION_THRESHOLD,
};
use crate::claim::{ClaimFlow, ClaimResult, GameId, WalletAddress};
use crate::env::{Clock, RandomSource};
use crate::error::{AcademyError, Result};
use crate::metrics::METRICS;
use crate::narration::{TutorChannel, TutorPose};
use crate::obs::SessionSpan;
use crate::quiz::{QuizMachine, QuizSession, QuizState};
use crate::scheduler::{ManualScheduler, Timer};
use crate::services::{BadgeService, QuizService, WalletConnector};

const GREETING: &str = "Hi, I'm your academy tutor. Together we'll walk through ERC-8004: \
                        first, mint an identity for your agent.";

/// Collaborators and ambient resources a session runs on.
pub struct SessionDeps {
    pub quiz_service: Arc<dyn QuizService>,
    pub badge_service: Arc<dyn BadgeService>,
    pub wallet: Arc<dyn WalletConnector>,
    pub clock: Arc<dyn Clock>,
    pub random: Box<dyn RandomSource>,
}

pub struct AcademySession {
    id: Uuid,
    academy: AcademyMachine,
    quiz: QuizMachine,
    claim: ClaimFlow,
    tutor: TutorChannel,
    scheduler: ManualScheduler,
    wallet: Arc<dyn WalletConnector>,
}

impl AcademySession {
    pub fn new(deps: SessionDeps) -> Self {
        let SessionDeps {
            quiz_service,
            badge_service,
            wallet,
            clock,
            random,
        } = deps;

        let mut session = Self {
            id: Uuid::new_v4(),
            academy: AcademyMachine::new(clock.clone(), random),
            quiz: QuizMachine::new(quiz_service),
            claim: ClaimFlow::new(GameId::Erc8004, badge_service, wallet.clone()),
            tutor: TutorChannel::new(clock),
            scheduler: ManualScheduler::new(),
            wallet,
        };
        session.tutor.speak(GREETING, TutorPose::Standing);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn agent(&self) -> &AgentState {
        self.academy.state()
    }

    pub fn quiz(&self) -> &QuizState {
        self.quiz.state()
    }

    pub fn quiz_session(&self) -> Option<&QuizSession> {
        self.quiz.session()
    }

    pub fn claim_result(&self) -> Option<&ClaimResult> {
        self.claim.result()
    }

    pub fn tutor(&self) -> &TutorChannel {
        &self.tutor
    }

    /// The challenge is offered once the agent is verified.
    pub fn challenge_unlocked(&self) -> bool {
        self.academy.state().is_verified()
    }

    pub fn quiz_passed(&self) -> bool {
        self.quiz.passed()
    }

    /// Verified, passed and claimed.
    pub fn is_complete(&self) -> bool {
        self.challenge_unlocked() && self.quiz_passed() && self.claim.is_minted()
    }

    /// Emit the metrics snapshot labelled with this session's id.
    pub fn flush_metrics(&self) {
        METRICS.flush_session(&self.id.to_string());
    }

    fn span(&self) -> SessionSpan {
        SessionSpan::enter(&self.id.to_string())
    }

    // -- progression -------------------------------------------------------

    pub fn mint_identity(&mut self) -> Result<String> {
        let _span = self.span();
        let agent_id = self.academy.mint_identity()?;
        self.tutor.speak(
            format!(
                "Your agent now has an on-chain identity: {agent_id}. \
                 Next, earn reputation by completing tasks."
            ),
            TutorPose::Praising,
        );
        Ok(agent_id)
    }

    pub fn perform_task(&mut self, task_type: TaskType, difficulty: Difficulty) -> Result<TaskResult> {
        let _span = self.span();
        let was_eligible = self.academy.state().can_proceed_to_validation();

        let result = match self.academy.perform_task(task_type, difficulty) {
            Ok(result) => result,
            Err(err @ AcademyError::PermissionDenied(_)) => {
                self.tutor.speak(
                    "Not so fast: hard tasks are reserved for verified agents. \
                     Prove your reliability through validation first.",
                    TutorPose::Teaching,
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let reputation = self.academy.state().reputation();
        if result.reward_delta >= 0 {
            self.tutor.speak(
                format!(
                    "Great job, the task got positive feedback: +{} reputation, {} in total.",
                    result.reward_delta, reputation
                ),
                TutorPose::Praising,
            );
        } else {
            self.tutor.speak(
                format!(
                    "That task drew negative feedback: {} reputation, {} in total. \
                     Keep going, you can recover.",
                    result.reward_delta, reputation
                ),
                TutorPose::Teaching,
            );
        }

        if !was_eligible && self.academy.state().can_proceed_to_validation() {
            self.tutor.speak(
                format!(
                    "You reached {REPUTATION_THRESHOLD} reputation. \
                     The validation layer is unlocked whenever you're ready."
                ),
                TutorPose::Teaching,
            );
        }
        Ok(result)
    }

    pub fn proceed_to_validation(&mut self) -> Result<()> {
        let _span = self.span();
        self.academy.proceed_to_validation()?;
        self.tutor.speak(
            "Welcome to validation. Submit your reputation proof to the registry.",
            TutorPose::Teaching,
        );
        Ok(())
    }

    /// Start the proof pipeline. Advance time to run it.
    pub fn submit_validation_proof(&mut self) -> Result<()> {
        let _span = self.span();
        self.academy.submit_validation_proof(&mut self.scheduler)?;
        self.tutor.speak(
            "Submitting your reputation proof to the validation registry...",
            TutorPose::Working,
        );
        Ok(())
    }

    /// Delay until the next timer fires, if any is pending.
    pub fn next_timer_delay(&self) -> Option<Duration> {
        self.scheduler.next_delay()
    }

    /// Advance virtual time by `by`, firing every timer that falls due.
    /// Timers scheduled while firing count from their parent's deadline.
    pub fn advance_time(&mut self, by: Duration) {
        let _span = self.span();
        let target = self.scheduler.elapsed() + by;
        while let Some(delay) = self.scheduler.next_delay() {
            if self.scheduler.elapsed() + delay > target {
                break;
            }
            if let Some(timer) = self.scheduler.fire_next() {
                self.handle_timer(timer);
            }
        }
        let remaining = target.saturating_sub(self.scheduler.elapsed());
        for timer in self.scheduler.advance(remaining) {
            self.handle_timer(timer);
        }
    }

    /// Fire timers until none are pending.
    pub fn run_pending_timers(&mut self) {
        while let Some(delay) = self.scheduler.next_delay() {
            self.advance_time(delay);
        }
    }

    fn handle_timer(&mut self, timer: Timer) {
        match self.academy.on_timer(timer, &mut self.scheduler) {
            Some(ValidationProgress::Phase(ValidationPhase::Stamping)) => {
                self.tutor.speak(
                    "A validator is checking your credentials now.",
                    TutorPose::Thinking,
                );
            }
            Some(ValidationProgress::Phase(ValidationPhase::Verified)) => {
                self.tutor.speak(
                    "Proof verified! High-value tasks are about to unlock.",
                    TutorPose::Praising,
                );
            }
            Some(ValidationProgress::Phase(_)) | None => {}
            Some(ValidationProgress::Completed) => {
                self.tutor.speak(
                    "You're a verified agent. Take the final challenge on ERC-8004 \
                     and pass it to earn your badge.",
                    TutorPose::Teaching,
                );
            }
        }
    }

    // -- quiz --------------------------------------------------------------

    pub async fn start_challenge(&mut self) -> Result<QuizSession> {
        let verified = self.challenge_unlocked();
        let result = self.quiz.start_challenge(verified).await;
        if let Err(err) = &result {
            if err.is_network() {
                self.tutor.speak(
                    format!("I couldn't open the challenge: {err}. Please try again."),
                    TutorPose::Thinking,
                );
            }
        }
        result
    }

    pub async fn submit_answer(&mut self, answer: &str) -> Result<QuizSession> {
        let session = self.quiz.submit_answer(answer).await?;
        if session.done {
            if session.is_passed() {
                self.tutor.speak(
                    "You passed the challenge! Claim your badge with a connected wallet.",
                    TutorPose::Praising,
                );
            } else {
                self.tutor.speak(
                    "Not this time. Review the material and retry the challenge.",
                    TutorPose::Teaching,
                );
            }
        }
        Ok(session)
    }

    pub async fn retry_challenge(&mut self) -> Result<QuizSession> {
        let verified = self.challenge_unlocked();
        self.quiz.retry(verified).await
    }

    /// Leave the challenge dialog. A passed challenge stays passed.
    pub fn close_challenge(&mut self) {
        self.quiz.close();
    }

    // -- claim -------------------------------------------------------------

    /// Claim the badge for `address`, prompting for a wallet when absent.
    pub async fn claim_reward(&mut self, address: Option<&WalletAddress>) -> Result<ClaimResult> {
        let passed = self.quiz.passed();
        match self.claim.claim_reward(passed, address).await {
            Ok(result) => {
                self.tutor.speak(
                    format!(
                        "Congratulations! Your ERC-8004 badge is minted as token {}.",
                        result.token_id
                    ),
                    TutorPose::Praising,
                );
                Ok(result)
            }
            Err(AcademyError::WalletNotConnected) => {
                self.tutor.speak(
                    "Connect a wallet first so I know where to send your badge.",
                    TutorPose::Teaching,
                );
                Err(AcademyError::WalletNotConnected)
            }
            Err(err) => {
                if let AcademyError::NetworkFailure(detail) = &err {
                    self.tutor.speak(
                        format!("Minting your badge failed: {detail}. Please try again later."),
                        TutorPose::Thinking,
                    );
                }
                Err(err)
            }
        }
    }

    /// Claim with whatever address the wallet currently reports.
    pub async fn claim_with_wallet(&mut self) -> Result<ClaimResult> {
        let address = self.wallet.address();
        self.claim_reward(address.as_ref()).await
    }

    // -- reset -------------------------------------------------------------

    /// Start over: progression, quiz, claim and transcript.
    pub fn reset(&mut self) {
        let _span = self.span();
        self.academy.reset(&mut self.scheduler);
        self.quiz.reset();
        self.claim.reset();
        self.tutor.clear();
        self.tutor.speak(
            "Let's start fresh! Ready to create a new agent?",
            TutorPose::Standing,
        );
    }
}
