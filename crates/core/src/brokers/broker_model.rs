//! Broker account and cached broker-report domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported brokerages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Broker {
    Zerodha,
    Upstox,
    AngelOne,
}

impl Broker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Broker::Zerodha => "ZERODHA",
            Broker::Upstox => "UPSTOX",
            Broker::AngelOne => "ANGEL_ONE",
        }
    }
}

impl fmt::Display for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One linked brokerage account belonging to a user.
///
/// The account is the unit of per-account sync locking and refresh iteration.
/// Credential and token lifecycle are handled by the broker-transport crates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerAccount {
    pub id: String,
    pub user_id: String,
    pub broker: Broker,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Instrument class of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionType {
    /// Equity bought for delivery; carries a cost basis.
    Delivery,
    /// Same-day equity trade; exposure only, no carried cost basis.
    Intraday,
    /// Futures and options contract.
    Fno,
}

/// One equity/fund lot as last reported by a broker.
///
/// Written by the broker-sync path on each successful refresh, superseded (not
/// merged) on the next one. Read-only to the aggregators. Broker-supplied
/// price/P&L figures are used verbatim when present and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedHolding {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub broker: Broker,
    pub symbol: String,
    pub exchange: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub last_price: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub day_change: Option<Decimal>,
    pub day_change_pct: Option<Decimal>,
    pub synced_at: DateTime<Utc>,
}

/// One open position as last reported by a broker.
///
/// Quantity is a magnitude; direction is implied by the position type in this
/// system. The contract fields are populated for FNO rows only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPosition {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub broker: Broker,
    pub symbol: String,
    pub position_type: PositionType,
    pub quantity: Decimal,
    pub buy_price: Decimal,
    pub value: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub mtm: Option<Decimal>,
    pub instrument_type: Option<String>,
    pub strike_price: Option<Decimal>,
    pub option_type: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub synced_at: DateTime<Utc>,
}

impl CachedPosition {
    /// A position is a derivative exactly when the broker reported contract
    /// metadata for it. `position_type == Fno` holds if and only if this does.
    pub fn is_derivative(&self) -> bool {
        self.instrument_type.is_some()
    }
}
