//! Sync safety module - refresh admission control and run logging.
//!
//! Aggregation reads are lock-free and may run with unlimited concurrency;
//! the broker refresh path is the only mutating path and the only one that
//! takes locks.

mod lock_manager;
mod market_hours;
mod sync_log_model;
mod sync_service;
mod sync_traits;

pub use lock_manager::{AccountLockGuard, GlobalLockGuard, SyncLockManager};
pub use market_hours::{MarketCalendarTrait, MarketHours};
pub use sync_log_model::{SyncRunLog, SyncStatus};
pub use sync_service::{SyncOutcome, SyncReport, SyncService, SyncServiceTrait};
pub use sync_traits::SyncLogRepositoryTrait;

#[cfg(test)]
mod tests;
