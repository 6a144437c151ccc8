//! Exchange trading-session predicate.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::utils::time_utils::DEFAULT_EXCHANGE_TZ;

/// Trading-calendar gate consulted before a scheduled refresh.
pub trait MarketCalendarTrait: Send + Sync {
    /// True iff the exchange is in session at the given instant.
    fn is_open_at(&self, instant: DateTime<Utc>) -> bool;

    /// Session check against the current wall clock.
    fn is_open_now(&self) -> bool {
        self.is_open_at(Utc::now())
    }
}

/// Trading session window for one exchange, in its local timezone.
///
/// Weekday gate (Mon-Fri) plus an inclusive open..=close window. No holiday
/// calendar is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl MarketHours {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime) -> Self {
        Self { tz, open, close }
    }

    /// National Stock Exchange session: Mon-Fri 09:15-15:30 IST.
    pub fn nse() -> Self {
        Self::new(
            DEFAULT_EXCHANGE_TZ,
            NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
        )
    }
}

impl MarketCalendarTrait for MarketHours {
    fn is_open_at(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.tz);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = local.time();
        time >= self.open && time <= self.close
    }
}
