//! Sync log repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::sync_log_model::SyncRunLog;
use crate::errors::Result;

/// Trait defining the contract for sync run log persistence.
#[async_trait]
pub trait SyncLogRepositoryTrait: Send + Sync {
    /// Completion time of the most recent successful run for a user, if any.
    fn latest_successful_sync(&self, user_id: &str) -> Result<Option<DateTime<Utc>>>;

    /// Records one completed run.
    async fn record(&self, log: SyncRunLog) -> Result<SyncRunLog>;
}
