//! Market price provider trait.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use super::market_data_model::MarketPrice;
use crate::errors::Result;

/// Trait defining the contract for the external market price feed.
#[async_trait]
pub trait MarketPriceProviderTrait: Send + Sync {
    /// Batched price lookup for a set of symbols.
    ///
    /// Aggregators call this exactly once per aggregation to bound external
    /// round-trips. Unknown symbols are omitted from the result map rather
    /// than reported as errors.
    async fn get_prices(&self, symbols: &HashSet<String>) -> Result<HashMap<String, MarketPrice>>;
}
