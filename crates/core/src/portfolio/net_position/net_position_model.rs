//! Net position domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::brokers::Broker;

/// Running cost basis for equity-class rows (holdings and DELIVERY positions).
///
/// Fields are private: the accumulated figures can only be read out through
/// the accessors, so an `EquityBasis` can never be added into a
/// [`DerivativeBasis`] or vice versa. The two instrument classes meet only at
/// the presentation boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquityBasis {
    invested: Decimal,
    quantity: Decimal,
}

impl EquityBasis {
    pub fn add(&mut self, quantity: Decimal, price: Decimal) {
        self.invested += quantity * price;
        self.quantity += quantity;
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn invested(&self) -> Decimal {
        self.invested
    }

    /// Quantity-weighted average price, or `None` when nothing accumulated.
    pub fn weighted_average(&self) -> Option<Decimal> {
        if self.quantity.is_zero() {
            None
        } else {
            Some(self.invested / self.quantity)
        }
    }
}

/// Running cost basis for FNO rows. Kept as a separate type from
/// [`EquityBasis`] so derivative buy prices cannot leak into an equity
/// average.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivativeBasis {
    invested: Decimal,
    quantity: Decimal,
}

impl DerivativeBasis {
    pub fn add(&mut self, quantity: Decimal, price: Decimal) {
        self.invested += quantity * price;
        self.quantity += quantity;
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn invested(&self) -> Decimal {
        self.invested
    }

    pub fn weighted_average(&self) -> Option<Decimal> {
        if self.quantity.is_zero() {
            None
        } else {
            Some(self.invested / self.quantity)
        }
    }
}

/// Per-symbol merge of all holdings and positions across a user's linked
/// broker accounts. Computed on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetPosition {
    pub symbol: String,
    /// Quantity contributed by each broker.
    pub broker_quantities: HashMap<Broker, Decimal>,
    pub total_quantity: Decimal,
    /// Blended buy price of whichever cost basis applies: the equity basis
    /// whenever any delivery quantity exists, else the derivative basis.
    pub average_buy_price: Decimal,
    pub current_price: Decimal,
    pub previous_close: Decimal,
    pub invested_value: Decimal,
    pub current_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub day_gain: Decimal,
    pub day_gain_pct: Decimal,
    pub is_derivative: bool,
    /// Mark-to-market P&L on the derivative leg; only for derivative symbols.
    pub mtm_pnl: Option<Decimal>,
    /// Day gain on the derivative leg; `None` when the previous close is
    /// unavailable rather than a fabricated number.
    pub derivative_day_gain: Option<Decimal>,
    pub derivative_day_gain_pct: Option<Decimal>,
}
