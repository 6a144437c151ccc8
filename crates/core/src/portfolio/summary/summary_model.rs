//! Portfolio summary view models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::brokers::{Broker, PositionType};

/// One holding row in the summary, fully priced.
///
/// Every field has been resolved through the fallback chain: broker-supplied
/// figure first, market feed second, zero last.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    pub symbol: String,
    pub exchange: String,
    pub broker: Broker,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub last_price: Decimal,
    pub close_price: Decimal,
    pub invested_value: Decimal,
    pub current_value: Decimal,
    pub pnl: Decimal,
    pub day_change: Decimal,
    pub day_change_pct: Decimal,
}

/// One open position row in the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub symbol: String,
    pub broker: Broker,
    pub position_type: PositionType,
    pub quantity: Decimal,
    pub buy_price: Decimal,
    pub current_price: Decimal,
    pub value: Decimal,
    pub pnl: Decimal,
    pub mtm: Option<Decimal>,
    pub is_derivative: bool,
    pub instrument_type: Option<String>,
    pub strike_price: Option<Decimal>,
    pub option_type: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// Portfolio-wide rollup across both detail lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub current_value: Decimal,
    pub invested_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub day_gain: Decimal,
    pub day_gain_pct: Decimal,
}

/// The full-portfolio response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub holdings: Vec<HoldingView>,
    pub positions: Vec<PositionView>,
    pub totals: PortfolioTotals,
    /// True when any position is FNO, signalling that P&L figures include
    /// margin-based instruments whose invested value is not directly
    /// comparable to equity.
    pub contains_derivatives: bool,
    /// Completion time of the most recent successful broker sync. Failed
    /// syncs never advance this.
    pub last_synced_at: Option<DateTime<Utc>>,
    pub as_of_date: NaiveDate,
}
