//! Broker refresh orchestration.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, warn};
use std::sync::Arc;

use super::lock_manager::SyncLockManager;
use super::market_hours::MarketCalendarTrait;
use super::sync_log_model::{SyncRunLog, SyncStatus};
use super::sync_traits::SyncLogRepositoryTrait;
use crate::brokers::{BrokerAccountRepositoryTrait, BrokerClientTrait};
use crate::errors::Result;

/// Per-account outcome of one refresh run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Accounts whose cached rows were overwritten.
    pub refreshed: Vec<String>,
    /// Accounts skipped because another refresh holds their lock.
    pub skipped: Vec<String>,
    /// Accounts whose broker call failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    pub fn status(&self) -> SyncStatus {
        if self.failed.is_empty() {
            SyncStatus::Success
        } else if self.refreshed.is_empty() {
            SyncStatus::Failed
        } else {
            SyncStatus::Partial
        }
    }
}

/// What happened to a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// The exchange is out of session; nothing was attempted.
    MarketClosed,
    /// Another refresh holds the global lock; nothing was attempted.
    AlreadyRunning,
}

#[async_trait]
pub trait SyncServiceTrait: Send + Sync {
    /// Refreshes every active broker account of a user, subject to the
    /// market-hours gate and the global/per-account locks.
    async fn refresh_user(&self, user_id: &str) -> Result<SyncOutcome>;
}

pub struct SyncService {
    account_repository: Arc<dyn BrokerAccountRepositoryTrait>,
    broker_client: Arc<dyn BrokerClientTrait>,
    sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
    locks: SyncLockManager,
    calendar: Arc<dyn MarketCalendarTrait>,
}

impl SyncService {
    pub fn new(
        account_repository: Arc<dyn BrokerAccountRepositoryTrait>,
        broker_client: Arc<dyn BrokerClientTrait>,
        sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
        locks: SyncLockManager,
        calendar: Arc<dyn MarketCalendarTrait>,
    ) -> Self {
        Self {
            account_repository,
            broker_client,
            sync_log_repository,
            locks,
            calendar,
        }
    }
}

#[async_trait]
impl SyncServiceTrait for SyncService {
    async fn refresh_user(&self, user_id: &str) -> Result<SyncOutcome> {
        if !self.calendar.is_open_now() {
            debug!("Market closed; skipping refresh for user {}", user_id);
            return Ok(SyncOutcome::MarketClosed);
        }

        // Held for the rest of the run; drops on every exit path.
        let Some(_global) = self.locks.try_global() else {
            debug!(
                "A refresh is already running; skipping request for user {}",
                user_id
            );
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let started_at = Utc::now();
        let accounts = self.account_repository.active_accounts_for_user(user_id)?;
        let mut report = SyncReport::default();

        for account in &accounts {
            let Some(_account_lock) = self.locks.try_account(&account.id) else {
                warn!(
                    "Account {} is locked by another refresh; skipping",
                    account.id
                );
                report.skipped.push(account.id.clone());
                continue;
            };
            match self.broker_client.refresh_account(account).await {
                Ok(()) => report.refreshed.push(account.id.clone()),
                Err(e) => {
                    // One account's failure must not abort the batch.
                    error!(
                        "Refresh failed for account {} ({}): {}",
                        account.id, account.broker, e
                    );
                    report.failed.push((account.id.clone(), e.to_string()));
                }
            }
        }

        let error = if report.failed.is_empty() {
            None
        } else {
            Some(
                report
                    .failed
                    .iter()
                    .map(|(id, message)| format!("{}: {}", id, message))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };
        let log = SyncRunLog::new(user_id.to_string(), report.status(), started_at, error);
        if let Err(e) = self.sync_log_repository.record(log).await {
            error!("Failed to record sync run for user {}: {}", user_id, e);
        }

        Ok(SyncOutcome::Completed(report))
    }
}
