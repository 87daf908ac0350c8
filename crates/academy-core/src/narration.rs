//! Tutor narration channel.
//!
//! An append-only transcript written by both machines and read by the
//! display layer. It carries no control flow: nothing reads it back to
//! decide a transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::env::Clock;

/// Who said a line, in the tutor chat or the quiz transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Tutor,
    User,
}

/// Cosmetic hint for how the tutor is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorPose {
    #[default]
    Standing,
    Teaching,
    Working,
    Thinking,
    Praising,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorEntry {
    /// Strictly increasing across the channel's lifetime, clears included.
    pub seq: u64,
    pub role: ChatRole,
    pub content: String,
    pub pose: TutorPose,
    pub timestamp: DateTime<Utc>,
}

pub struct TutorChannel {
    entries: Vec<TutorEntry>,
    pose: TutorPose,
    next_seq: u64,
    clock: Arc<dyn Clock>,
}

impl TutorChannel {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Vec::new(),
            pose: TutorPose::default(),
            next_seq: 0,
            clock,
        }
    }

    /// Append a tutor line and switch to `pose`.
    ///
    /// Timestamps never go backwards even if the clock does.
    pub fn speak(&mut self, message: impl Into<String>, pose: TutorPose) -> &TutorEntry {
        let now = self.clock.now();
        let timestamp = match self.entries.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        self.pose = pose;
        self.entries.push(TutorEntry {
            seq: self.next_seq,
            role: ChatRole::Tutor,
            content: message.into(),
            pose,
            timestamp,
        });
        self.next_seq += 1;
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TutorEntry] {
        &self.entries
    }

    /// Entries with `seq >= from`, for incremental readers.
    pub fn entries_since(&self, from: u64) -> &[TutorEntry] {
        let start = self.entries.partition_point(|e| e.seq < from);
        &self.entries[start..]
    }

    pub fn latest(&self) -> Option<&TutorEntry> {
        self.entries.last()
    }

    pub fn pose(&self) -> TutorPose {
        self.pose
    }

    /// Sequence number the next entry will get.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Drop the transcript and the pose. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pose = TutorPose::default();
    }
}
