//! In-memory fakes for the collaborator traits and the random source
//! (testing and offline play).
//!
//! Provides `FakeQuizService`, `FakeBadgeService`, `RecordingWallet` and
//! `ScriptedRandom`, all satisfying their trait contracts without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::claim::{ClaimResult, GameId, WalletAddress};
use crate::env::RandomSource;
use crate::error::{ServiceError, ServiceResult};
use crate::services::{AnswerRequest, BadgeService, QuizService, QuizTurn, WalletConnector};

// ---------------------------------------------------------------------------
// ScriptedRandom
// ---------------------------------------------------------------------------

/// Random source replaying fixed draws.
///
/// Scripted unit draws are returned in order, then `fallback` forever.
/// Bytes come from a counter so successive identities differ.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    fallback: f64,
    counter: u8,
}

impl ScriptedRandom {
    /// Every draw returns `value`.
    pub fn always(value: f64) -> Self {
        Self {
            draws: VecDeque::new(),
            fallback: value,
            counter: 0,
        }
    }

    /// Replay `values`, then fall back to a positive-outcome draw.
    pub fn sequence(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: values.into_iter().collect(),
            fallback: 0.0,
            counter: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            self.counter = self.counter.wrapping_add(1);
            *byte = self.counter;
        }
    }
}

// ---------------------------------------------------------------------------
// FakeQuizService
// ---------------------------------------------------------------------------

/// Scripted quiz grader.
///
/// Unscripted starts open a session with a fresh UUID; unscripted answers
/// fail with a transport error.
#[derive(Debug, Default)]
pub struct FakeQuizService {
    starts: Mutex<VecDeque<ServiceResult<QuizTurn>>>,
    answers: Mutex<VecDeque<ServiceResult<QuizTurn>>>,
    start_calls: AtomicUsize,
    answer_requests: Mutex<Vec<AnswerRequest>>,
}

impl FakeQuizService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_start(&self, result: ServiceResult<QuizTurn>) {
        self.starts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    pub fn push_answer(&self, result: ServiceResult<QuizTurn>) {
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn answer_requests(&self) -> Vec<AnswerRequest> {
        self.answer_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl QuizService for FakeQuizService {
    async fn start_quiz(&self) -> ServiceResult<QuizTurn> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .starts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| {
            Ok(QuizTurn::opening(
                Uuid::new_v4().to_string(),
                "Question 1: what does ERC-8004 register for an agent?",
            ))
        })
    }

    async fn submit_answer(&self, request: &AnswerRequest) -> ServiceResult<QuizTurn> {
        self.answer_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        let scripted = self
            .answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| Err(ServiceError::Transport("no scripted answer".into())))
    }
}

// ---------------------------------------------------------------------------
// FakeBadgeService
// ---------------------------------------------------------------------------

/// Scripted badge minter. Unscripted claims succeed with increasing token ids.
#[derive(Debug, Default)]
pub struct FakeBadgeService {
    results: Mutex<VecDeque<ServiceResult<ClaimResult>>>,
    calls: Mutex<Vec<(GameId, WalletAddress)>>,
    next_token: AtomicU64,
}

impl FakeBadgeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_result(&self, result: ServiceResult<ClaimResult>) {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<(GameId, WalletAddress)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl BadgeService for FakeBadgeService {
    async fn claim_badge(&self, game: GameId, address: &WalletAddress) -> ServiceResult<ClaimResult> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((game, address.clone()));
        let scripted = self
            .results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| {
            let token_id = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ClaimResult {
                token_id,
                contract_address: "0x0000000000000000000000000000000000008004".into(),
                tx_hash: format!("0x{token_id:064x}"),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingWallet
// ---------------------------------------------------------------------------

/// Wallet that records connection prompts.
#[derive(Debug, Default)]
pub struct RecordingWallet {
    address: Mutex<Option<WalletAddress>>,
    connection_requests: AtomicUsize,
}

impl RecordingWallet {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: WalletAddress) -> Self {
        Self {
            address: Mutex::new(Some(address)),
            connection_requests: AtomicUsize::new(0),
        }
    }

    pub fn connect(&self, address: WalletAddress) {
        *self.address.lock().unwrap_or_else(|e| e.into_inner()) = Some(address);
    }

    pub fn connection_requests(&self) -> usize {
        self.connection_requests.load(Ordering::SeqCst)
    }
}

impl WalletConnector for RecordingWallet {
    fn address(&self) -> Option<WalletAddress> {
        self.address.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn request_connection(&self) {
        self.connection_requests.fetch_add(1, Ordering::SeqCst);
    }
}
