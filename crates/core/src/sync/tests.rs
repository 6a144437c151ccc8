//! Tests for sync admission control and refresh orchestration.

use super::*;
use std::sync::Arc;

// ============================================================================
// Lock Manager Tests
// ============================================================================

mod lock_manager_tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn account_lock_is_mutually_exclusive() {
        let locks = SyncLockManager::new();

        let guard = locks.try_account("ACC-A");
        assert!(guard.is_some());
        assert!(locks.try_account("ACC-A").is_none());

        drop(guard);
        assert!(locks.try_account("ACC-A").is_some());
    }

    #[test]
    fn global_lock_releases_on_drop() {
        let locks = SyncLockManager::new();

        let guard = locks.try_global();
        assert!(guard.is_some());
        assert!(locks.is_global_held());
        assert!(locks.try_global().is_none());

        drop(guard);
        assert!(!locks.is_global_held());
        assert!(locks.try_global().is_some());
    }

    #[test]
    fn distinct_accounts_lock_independently() {
        let locks = SyncLockManager::new();

        let _a = locks.try_account("ACC-A").unwrap();
        let b = locks.try_account("ACC-B");
        assert!(b.is_some());
        assert!(locks.is_account_held("ACC-A"));

        drop(b);
        assert!(locks.is_account_held("ACC-A"));
        assert!(!locks.is_account_held("ACC-B"));
    }

    #[test]
    fn concurrent_account_lock_has_exactly_one_winner() {
        let locks = SyncLockManager::new();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    locks.try_account("ACC-A")
                })
            })
            .collect();

        let guards: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(guards.iter().filter(|g| g.is_some()).count(), 1);

        drop(guards);
        assert!(locks.try_account("ACC-A").is_some());
    }
}

// ============================================================================
// Market Hours Tests
// ============================================================================

mod market_hours_tests {
    use super::*;
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};

    // 2024-01-02 is a Tuesday; IST is UTC+05:30.
    fn tuesday_ist(hour: u32, minute: u32) -> DateTime<Utc> {
        let ist_minutes = (hour * 60 + minute) as i64 - 330;
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + chrono::Duration::minutes(ist_minutes)
    }

    #[test]
    fn session_window_is_inclusive_at_both_ends() {
        let hours = MarketHours::nse();

        assert!(hours.is_open_at(tuesday_ist(9, 15)));
        assert!(hours.is_open_at(tuesday_ist(15, 30)));
        assert!(hours.is_open_at(tuesday_ist(12, 0)));

        assert!(!hours.is_open_at(tuesday_ist(9, 14)));
        assert!(!hours.is_open_at(tuesday_ist(15, 31)));
    }

    #[test]
    fn weekends_are_closed_at_any_time() {
        let hours = MarketHours::nse();

        // 2024-01-06 is a Saturday, 2024-01-07 a Sunday; 12:00 IST = 06:30 UTC.
        let saturday = Utc.with_ymd_and_hms(2024, 1, 6, 6, 30, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2024, 1, 7, 6, 30, 0).unwrap();
        assert!(!hours.is_open_at(saturday));
        assert!(!hours.is_open_at(sunday));
    }

    #[test]
    fn custom_session_windows_are_honoured() {
        let hours = MarketHours::new(
            chrono_tz::Asia::Kolkata,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );

        assert!(hours.is_open_at(tuesday_ist(9, 0)));
        assert!(hours.is_open_at(tuesday_ist(17, 0)));
        assert!(!hours.is_open_at(tuesday_ist(8, 59)));
        assert!(!hours.is_open_at(tuesday_ist(17, 1)));
    }
}

// ============================================================================
// Sync Service Tests
// ============================================================================

mod sync_service_tests {
    use super::*;
    use crate::brokers::{
        Broker, BrokerAccount, BrokerAccountRepositoryTrait, BrokerClientTrait,
    };
    use crate::errors::{Error, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct MockAccountRepository {
        accounts: Vec<BrokerAccount>,
    }

    impl BrokerAccountRepositoryTrait for MockAccountRepository {
        fn get_by_id(&self, account_id: &str) -> Result<BrokerAccount> {
            self.accounts
                .iter()
                .find(|a| a.id == account_id)
                .cloned()
                .ok_or_else(|| Error::Repository(format!("Account {} not found", account_id)))
        }

        fn active_accounts_for_user(&self, _user_id: &str) -> Result<Vec<BrokerAccount>> {
            Ok(self
                .accounts
                .iter()
                .filter(|a| a.is_active)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MockBrokerClient {
        failing: HashSet<String>,
        refreshed: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BrokerClientTrait for MockBrokerClient {
        async fn refresh_account(&self, account: &BrokerAccount) -> Result<()> {
            if self.failing.contains(&account.id) {
                return Err(Error::Broker(format!(
                    "token expired for {}",
                    account.id
                )));
            }
            self.refreshed.lock().unwrap().push(account.id.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSyncLog {
        records: Arc<Mutex<Vec<SyncRunLog>>>,
    }

    #[async_trait]
    impl SyncLogRepositoryTrait for RecordingSyncLog {
        fn latest_successful_sync(&self, _user_id: &str) -> Result<Option<DateTime<Utc>>> {
            unimplemented!()
        }

        async fn record(&self, log: SyncRunLog) -> Result<SyncRunLog> {
            self.records.lock().unwrap().push(log.clone());
            Ok(log)
        }
    }

    struct FixedCalendar(bool);

    impl MarketCalendarTrait for FixedCalendar {
        fn is_open_at(&self, _instant: DateTime<Utc>) -> bool {
            self.0
        }
    }

    fn account(id: &str, broker: Broker) -> BrokerAccount {
        BrokerAccount {
            id: id.to_string(),
            user_id: "U1".to_string(),
            broker,
            display_name: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct Harness {
        service: SyncService,
        locks: SyncLockManager,
        refreshed: Arc<Mutex<Vec<String>>>,
        records: Arc<Mutex<Vec<SyncRunLog>>>,
    }

    fn harness(accounts: Vec<BrokerAccount>, failing: &[&str], market_open: bool) -> Harness {
        let locks = SyncLockManager::new();
        let refreshed = Arc::new(Mutex::new(Vec::new()));
        let records = Arc::new(Mutex::new(Vec::new()));
        let client = MockBrokerClient {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            refreshed: Arc::clone(&refreshed),
        };
        let service = SyncService::new(
            Arc::new(MockAccountRepository { accounts }),
            Arc::new(client),
            Arc::new(RecordingSyncLog {
                records: Arc::clone(&records),
            }),
            locks.clone(),
            Arc::new(FixedCalendar(market_open)),
        );
        Harness {
            service,
            locks,
            refreshed,
            records,
        }
    }

    #[tokio::test]
    async fn refresh_skips_entirely_when_market_is_closed() {
        let h = harness(vec![account("ACC-1", Broker::Zerodha)], &[], false);

        let outcome = h.service.refresh_user("U1").await.unwrap();
        assert_eq!(outcome, SyncOutcome::MarketClosed);
        assert!(h.refreshed.lock().unwrap().is_empty());
        assert!(h.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_skips_when_another_refresh_holds_the_global_lock() {
        let h = harness(vec![account("ACC-1", Broker::Zerodha)], &[], true);

        let _held = h.locks.try_global().unwrap();
        let outcome = h.service.refresh_user("U1").await.unwrap();
        assert_eq!(outcome, SyncOutcome::AlreadyRunning);
        assert!(h.refreshed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failing_account_does_not_abort_the_batch() {
        let h = harness(
            vec![
                account("ACC-1", Broker::Zerodha),
                account("ACC-2", Broker::Upstox),
                account("ACC-3", Broker::AngelOne),
            ],
            &["ACC-2"],
            true,
        );

        let outcome = h.service.refresh_user("U1").await.unwrap();
        let SyncOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(report.refreshed, vec!["ACC-1", "ACC-3"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "ACC-2");
        assert_eq!(report.status(), SyncStatus::Partial);

        let records = h.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, SyncStatus::Partial);
        assert!(records[0].error.as_ref().unwrap().contains("ACC-2"));
    }

    #[tokio::test]
    async fn locked_accounts_are_skipped_not_failed() {
        let h = harness(
            vec![
                account("ACC-1", Broker::Zerodha),
                account("ACC-2", Broker::Upstox),
            ],
            &[],
            true,
        );

        let _held = h.locks.try_account("ACC-2").unwrap();
        let outcome = h.service.refresh_user("U1").await.unwrap();
        let SyncOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(report.refreshed, vec!["ACC-1"]);
        assert_eq!(report.skipped, vec!["ACC-2"]);
        assert!(report.failed.is_empty());
        assert_eq!(report.status(), SyncStatus::Success);
    }

    #[tokio::test]
    async fn every_lock_is_released_after_a_run_with_failures() {
        let h = harness(
            vec![
                account("ACC-1", Broker::Zerodha),
                account("ACC-2", Broker::Upstox),
            ],
            &["ACC-1", "ACC-2"],
            true,
        );

        let outcome = h.service.refresh_user("U1").await.unwrap();
        let SyncOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(report.status(), SyncStatus::Failed);

        assert!(!h.locks.is_global_held());
        assert!(!h.locks.is_account_held("ACC-1"));
        assert!(!h.locks.is_account_held("ACC-2"));

        // A later attempt is admitted again.
        let outcome = h.service.refresh_user("U1").await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn successful_run_records_a_success_log() {
        let h = harness(vec![account("ACC-1", Broker::Zerodha)], &[], true);

        h.service.refresh_user("U1").await.unwrap();

        let records = h.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        let log = &records[0];
        assert_eq!(log.user_id, "U1");
        assert_eq!(log.status, SyncStatus::Success);
        assert!(log.error.is_none());
        assert!(!log.id.is_empty());
        assert!(log.completed_at >= log.started_at);
    }
}
