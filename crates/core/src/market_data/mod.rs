//! Market data module - price model and provider trait.

mod market_data_model;
mod market_data_traits;

pub use market_data_model::MarketPrice;
pub use market_data_traits::MarketPriceProviderTrait;
