// file: src/models/sync.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Counts of local mutations made by one reconciliation.
///
/// `removed` counts deactivated calendars for a calendar pass and deleted
/// events for an event pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

impl SyncSummary {
    pub fn merge(&mut self, other: SyncSummary) {
        self.added += other.added;
        self.updated += other.updated;
        self.removed += other.removed;
    }

    pub fn total(&self) -> usize {
        self.added + self.updated + self.removed
    }
}

/// Retry bookkeeping for a user's scheduled refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SyncState {
    pub user_id: i64,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: i64,
}

impl SyncState {
    pub fn is_failing(&self) -> bool {
        self.consecutive_failures > 0
    }
}
