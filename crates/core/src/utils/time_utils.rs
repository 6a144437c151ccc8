use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Canonical exchange timezone for business dates.
/// For an India-focused broker aggregator, Asia/Kolkata is the home market.
pub const DEFAULT_EXCHANGE_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Converts a UTC instant to a business date in the given timezone.
///
/// This is the single source of truth for deriving a "business date" from a
/// timestamp.
pub fn business_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Convenience function that uses the default exchange timezone.
pub fn business_date_today() -> NaiveDate {
    business_date_from_utc(Utc::now(), DEFAULT_EXCHANGE_TZ)
}
