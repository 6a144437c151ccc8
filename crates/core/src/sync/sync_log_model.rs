//! Sync run log domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Every attempted account refreshed.
    #[default]
    Success,
    /// Some accounts refreshed, some failed.
    Partial,
    /// No account refreshed.
    Failed,
}

/// One recorded refresh attempt against broker APIs.
///
/// The summary view surfaces the completion time of the latest *successful*
/// entry as "last updated"; failed runs never advance it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunLog {
    pub id: String,
    pub user_id: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Per-account failure detail when the run was not a full success.
    pub error: Option<String>,
}

impl SyncRunLog {
    pub fn new(
        user_id: String,
        status: SyncStatus,
        started_at: DateTime<Utc>,
        error: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            status,
            started_at,
            completed_at: Utc::now(),
            error,
        }
    }
}
