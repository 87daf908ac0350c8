//! Timer scheduling for time-gated transitions.
//!
//! The validation pipeline advances on timers. Machines register timers on a
//! [`Scheduler`] and the driver feeds fired timers back in. [`ManualScheduler`]
//! keeps virtual time so tests fast-forward without sleeping, and the CLI
//! sleeps for [`ManualScheduler::next_delay`] between firings.

use std::collections::BTreeMap;
use std::time::Duration;

/// A timer the academy machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// The current validation phase has run its course.
    ValidationPhaseElapsed,
}

/// Registers timers for later delivery.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer);

    /// Drop every pending timer.
    fn cancel_all(&mut self);
}

/// Virtual-time scheduler. Timers fire in deadline order, ties in
/// registration order.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    elapsed: Duration,
    next_seq: u64,
    pending: BTreeMap<(Duration, u64), Timer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time until the earliest pending timer is due.
    pub fn next_delay(&self) -> Option<Duration> {
        self.pending
            .keys()
            .next()
            .map(|(deadline, _)| deadline.saturating_sub(self.elapsed))
    }

    /// Advance virtual time and return every timer that became due.
    pub fn advance(&mut self, by: Duration) -> Vec<Timer> {
        self.elapsed += by;
        let mut fired = Vec::new();
        loop {
            let Some(&key) = self.pending.keys().next() else {
                break;
            };
            if key.0 > self.elapsed {
                break;
            }
            if let Some(timer) = self.pending.remove(&key) {
                fired.push(timer);
            }
        }
        fired
    }

    /// Jump straight to the next deadline and fire that one timer.
    pub fn fire_next(&mut self) -> Option<Timer> {
        let &key = self.pending.keys().next()?;
        self.elapsed = self.elapsed.max(key.0);
        self.pending.remove(&key)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) {
        let key = (self.elapsed + delay, self.next_seq);
        self.next_seq += 1;
        self.pending.insert(key, timer);
    }

    fn cancel_all(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_only_when_due() {
        let mut sched = ManualScheduler::new();
        sched.schedule(Duration::from_secs(2), Timer::ValidationPhaseElapsed);

        assert!(sched.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(sched.next_delay(), Some(Duration::from_secs(1)));
        assert_eq!(
            sched.advance(Duration::from_secs(1)),
            vec![Timer::ValidationPhaseElapsed]
        );
        assert!(sched.is_idle());
    }

    #[test]
    fn advance_fires_multiple_in_order() {
        let mut sched = ManualScheduler::new();
        sched.schedule(Duration::from_secs(3), Timer::ValidationPhaseElapsed);
        sched.schedule(Duration::from_secs(1), Timer::ValidationPhaseElapsed);
        let fired = sched.advance(Duration::from_secs(10));
        assert_eq!(fired.len(), 2);
        assert_eq!(sched.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn fire_next_jumps_to_deadline() {
        let mut sched = ManualScheduler::new();
        sched.schedule(Duration::from_secs(5), Timer::ValidationPhaseElapsed);
        assert_eq!(sched.fire_next(), Some(Timer::ValidationPhaseElapsed));
        assert_eq!(sched.elapsed(), Duration::from_secs(5));
        assert_eq!(sched.fire_next(), None);
    }

    #[test]
    fn cancel_all_clears_pending() {
        let mut sched = ManualScheduler::new();
        sched.schedule(Duration::from_secs(1), Timer::ValidationPhaseElapsed);
        sched.cancel_all();
        assert!(sched.advance(Duration::from_secs(5)).is_empty());
        assert_eq!(sched.next_delay(), None);
    }
}
