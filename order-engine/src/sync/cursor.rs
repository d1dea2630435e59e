//! Sync cursor
//!
//! Checkpoint of what the sync worker has durably merged. Owned by the
//! worker - it is not a global, and nothing outside the sync path writes
//! it. Advanced only after a whole batch commits, so it never moves past
//! an order that failed to merge; rolled back only by an explicit
//! `reset()` resync.

use serde::{Deserialize, Serialize};

/// Sync progress checkpoint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncCursor {
    /// Watermark of the last fully-merged poll (millis). The next poll
    /// asks for orders updated after this point.
    pub last_poll_millis: i64,
    /// Highest push sequence observed, for lag diagnostics
    pub last_push_sequence: u64,
}

impl SyncCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the poll watermark after a clean batch
    pub fn advance_poll(&mut self, watermark_millis: i64) {
        if watermark_millis > self.last_poll_millis {
            self.last_poll_millis = watermark_millis;
        }
    }

    /// Record a push delivery
    pub fn note_push_sequence(&mut self, sequence: u64) {
        if sequence > self.last_push_sequence {
            self.last_push_sequence = sequence;
        }
    }

    /// Explicit resync: forget all progress and re-poll from epoch.
    /// Merge idempotence makes the replay safe.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
