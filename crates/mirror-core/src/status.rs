//! Shared sync status record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the most recent reconciliation activity.
///
/// Mutated only inside the engine's critical section; served verbatim as
/// the HTTP status document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// When the engine last *attempted* a reconciliation, successful or not.
    pub last_checked: Option<DateTime<Utc>>,
    /// When working-copy content last actually changed (a clone or a pull
    /// that moved the checkout).
    pub last_updated: Option<DateTime<Utc>>,
    /// Commit hash the working copy was last synced to.
    pub latest_commit: Option<String>,
    /// Whether the most recent attempt performed a fresh clone.
    pub cloned: bool,
}
