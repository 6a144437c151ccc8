//! Market data domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last traded price and previous close for one symbol.
///
/// Supplied by an external feed; a symbol the feed does not know is simply
/// absent from the result map, and the aggregators value it at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrice {
    pub symbol: String,
    pub last_price: Decimal,
    pub prev_close: Decimal,
}
