//! In-process advisory locks gating broker refresh.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One exclusive global refresh lock plus one lock per broker account.
///
/// Acquisition is non-blocking: a held lock is a "try again later" signal
/// communicated by `None`, never an error and never a queue. Release happens
/// by dropping the returned guard, so every exit path (success, error, panic)
/// releases, and only the holder can release.
///
/// State lives in local memory and is lost on restart. A crash mid-sync
/// therefore permits a later attempt rather than deadlocking; cached rows are
/// idempotent overwrites, so an interrupted refresh leaves nothing to repair.
#[derive(Clone, Default)]
pub struct SyncLockManager {
    global: Arc<AtomicBool>,
    accounts: Arc<DashMap<String, ()>>,
}

impl SyncLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking attempt at the single global refresh lock.
    pub fn try_global(&self) -> Option<GlobalLockGuard> {
        if self
            .global
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(GlobalLockGuard {
                flag: Arc::clone(&self.global),
            })
        } else {
            None
        }
    }

    /// Non-blocking per-account mutual exclusion, an atomic insert-if-absent.
    pub fn try_account(&self, account_id: &str) -> Option<AccountLockGuard> {
        match self.accounts.entry(account_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(AccountLockGuard {
                    accounts: Arc::clone(&self.accounts),
                    account_id: account_id.to_string(),
                })
            }
        }
    }

    pub fn is_global_held(&self) -> bool {
        self.global.load(Ordering::Acquire)
    }

    pub fn is_account_held(&self, account_id: &str) -> bool {
        self.accounts.contains_key(account_id)
    }
}

/// Holds the global refresh lock until dropped.
pub struct GlobalLockGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for GlobalLockGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Holds one broker account's refresh lock until dropped.
pub struct AccountLockGuard {
    accounts: Arc<DashMap<String, ()>>,
    account_id: String,
}

impl Drop for AccountLockGuard {
    fn drop(&mut self) {
        self.accounts.remove(&self.account_id);
    }
}
