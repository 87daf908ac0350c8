//! Global atomic counters for academy sessions.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush_session`] when a player's session ends to emit the
//! current values as a single `tracing::info!` event labelled with the
//! session id, or [`Metrics::flush`] for an unlabelled snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    tasks_performed: AtomicU64,
    answers_submitted: AtomicU64,
    validations_completed: AtomicU64,
    claims_minted: AtomicU64,
    collaborator_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            tasks_performed: AtomicU64::new(0),
            answers_submitted: AtomicU64::new(0),
            validations_completed: AtomicU64::new(0),
            claims_minted: AtomicU64::new(0),
            collaborator_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_tasks_performed(&self) {
        self.tasks_performed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tasks_performed", "counter incremented");
    }

    pub fn inc_answers_submitted(&self) {
        self.answers_submitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "answers_submitted", "counter incremented");
    }

    pub fn inc_validations_completed(&self) {
        self.validations_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "validations_completed", "counter incremented");
    }

    pub fn inc_claims_minted(&self) {
        self.claims_minted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "claims_minted", "counter incremented");
    }

    pub fn inc_collaborator_failures(&self) {
        self.collaborator_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "collaborator_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        self.emit(None);
    }

    /// Like [`flush`](Self::flush), tagged with the session that ran.
    pub fn flush_session(&self, session_id: &str) {
        self.emit(Some(session_id));
    }

    fn emit(&self, session_id: Option<&str>) {
        tracing::info!(
            metric = "flush",
            session_id,
            tasks_performed = self.tasks_performed(),
            answers_submitted = self.answers_submitted(),
            validations_completed = self.validations_completed(),
            claims_minted = self.claims_minted(),
            collaborator_failures = self.collaborator_failures(),
        );
    }

    pub fn tasks_performed(&self) -> u64 {
        self.tasks_performed.load(Ordering::Relaxed)
    }

    pub fn answers_submitted(&self) -> u64 {
        self.answers_submitted.load(Ordering::Relaxed)
    }

    pub fn validations_completed(&self) -> u64 {
        self.validations_completed.load(Ordering::Relaxed)
    }

    pub fn claims_minted(&self) -> u64 {
        self.claims_minted.load(Ordering::Relaxed)
    }

    pub fn collaborator_failures(&self) -> u64 {
        self.collaborator_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.tasks_performed.store(0, Ordering::Relaxed);
        self.answers_submitted.store(0, Ordering::Relaxed);
        self.validations_completed.store(0, Ordering::Relaxed);
        self.claims_minted.store(0, Ordering::Relaxed);
        self.collaborator_failures.store(0, Ordering::Relaxed);
    }
}
