//! Portfolio summary aggregation service.

use async_trait::async_trait;
use log::{debug, error, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::brokers::{CachedHolding, CachedPosition, PositionStoreTrait, PositionType};
use crate::constants::PERCENT_DECIMAL_PRECISION;
use crate::errors::Result;
use crate::market_data::{MarketPrice, MarketPriceProviderTrait};
use crate::portfolio::summary::summary_model::{
    HoldingView, PortfolioSummary, PortfolioTotals, PositionView,
};
use crate::sync::SyncLogRepositoryTrait;
use crate::utils::time_utils::business_date_today;

#[async_trait]
pub trait PortfolioSummaryServiceTrait: Send + Sync {
    /// Builds the full-portfolio view for a user. Always returns a summary;
    /// the worst outcome for a degraded symbol is a zero-valued row.
    async fn get_summary(&self, user_id: &str) -> Result<PortfolioSummary>;
}

pub struct PortfolioSummaryService {
    position_store: Arc<dyn PositionStoreTrait>,
    price_provider: Arc<dyn MarketPriceProviderTrait>,
    sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
}

/// The one fallback rule for broker-reported figures: the broker's number is
/// authoritative when present, the market feed fills gaps, zero is the floor.
fn first_available(broker_supplied: Option<Decimal>, market: Option<Decimal>) -> Decimal {
    broker_supplied.or(market).unwrap_or(Decimal::ZERO)
}

fn convert_holding(holding: &CachedHolding, price: Option<&MarketPrice>) -> HoldingView {
    let last_price = first_available(holding.last_price, price.map(|p| p.last_price));
    let close_price = first_available(holding.close_price, price.map(|p| p.prev_close));

    let invested_value = holding.quantity * holding.average_price;
    let current_value = holding.quantity * last_price;

    // An unpriced holding must not read as a 100% loss: computed figures are
    // floored to zero whenever the resolved price is non-positive.
    let pnl = match holding.pnl {
        Some(pnl) => pnl,
        None if last_price > Decimal::ZERO => current_value - invested_value,
        None => Decimal::ZERO,
    };
    let day_change = match holding.day_change {
        Some(change) => change,
        None if last_price > Decimal::ZERO && close_price > Decimal::ZERO => {
            (last_price - close_price) * holding.quantity
        }
        None => Decimal::ZERO,
    };
    let day_change_pct = match holding.day_change_pct {
        Some(pct) => pct,
        None if last_price > Decimal::ZERO && close_price > Decimal::ZERO => {
            ((last_price - close_price) / close_price * dec!(100))
                .round_dp(PERCENT_DECIMAL_PRECISION)
        }
        None => Decimal::ZERO,
    };

    HoldingView {
        symbol: holding.symbol.clone(),
        exchange: holding.exchange.clone(),
        broker: holding.broker,
        quantity: holding.quantity,
        average_price: holding.average_price,
        last_price,
        close_price,
        invested_value,
        current_value,
        pnl,
        day_change,
        day_change_pct,
    }
}

fn convert_position(position: &CachedPosition, price: Option<&MarketPrice>) -> PositionView {
    // The store's value/pnl/mtm are assumed already correct; this conversion
    // is presentation, not recomputation.
    let derived_price = position.value.and_then(|value| {
        if position.quantity.is_zero() {
            None
        } else {
            Some(value / position.quantity)
        }
    });
    let current_price = first_available(derived_price, price.map(|p| p.last_price));
    let value = position
        .value
        .unwrap_or(position.quantity * current_price);
    let pnl = match position.pnl {
        Some(pnl) => pnl,
        None if current_price > Decimal::ZERO => {
            (current_price - position.buy_price) * position.quantity
        }
        None => Decimal::ZERO,
    };

    PositionView {
        symbol: position.symbol.clone(),
        broker: position.broker,
        position_type: position.position_type,
        quantity: position.quantity,
        buy_price: position.buy_price,
        current_price,
        value,
        pnl,
        mtm: position.mtm,
        is_derivative: position.is_derivative(),
        instrument_type: position.instrument_type.clone(),
        strike_price: position.strike_price,
        option_type: position.option_type.clone(),
        expiry_date: position.expiry_date,
    }
}

fn compute_totals(holdings: &[HoldingView], positions: &[PositionView]) -> PortfolioTotals {
    let mut current_value = Decimal::ZERO;
    let mut invested_value = Decimal::ZERO;
    let mut day_gain = Decimal::ZERO;

    for holding in holdings {
        current_value += holding.current_value;
        invested_value += holding.invested_value;
        day_gain += holding.day_change;
    }
    for position in positions {
        current_value += position.value;
        invested_value += position.quantity * position.buy_price;
        // Open positions are opened intraday or margin-marked daily; their
        // mark (or P&L when unmarked) is the day-gain contribution.
        day_gain += position.mtm.unwrap_or(position.pnl);
    }

    let unrealized_pnl = current_value - invested_value;
    let denominator = current_value - day_gain;
    let day_gain_pct = if denominator.is_zero() {
        Decimal::ZERO
    } else {
        (day_gain / denominator * dec!(100)).round_dp(PERCENT_DECIMAL_PRECISION)
    };

    PortfolioTotals {
        current_value,
        invested_value,
        unrealized_pnl,
        day_gain,
        day_gain_pct,
    }
}

impl PortfolioSummaryService {
    pub fn new(
        position_store: Arc<dyn PositionStoreTrait>,
        price_provider: Arc<dyn MarketPriceProviderTrait>,
        sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
    ) -> Self {
        Self {
            position_store,
            price_provider,
            sync_log_repository,
        }
    }

    async fn fetch_prices_best_effort(
        &self,
        symbols: &HashSet<String>,
    ) -> HashMap<String, MarketPrice> {
        if symbols.is_empty() {
            return HashMap::new();
        }
        match self.price_provider.get_prices(symbols).await {
            Ok(prices) => prices,
            Err(e) => {
                error!(
                    "Market price lookup failed for {} symbols: {}. Valuing affected rows at zero.",
                    symbols.len(),
                    e
                );
                HashMap::new()
            }
        }
    }
}

#[async_trait]
impl PortfolioSummaryServiceTrait for PortfolioSummaryService {
    async fn get_summary(&self, user_id: &str) -> Result<PortfolioSummary> {
        let cached_holdings = self.position_store.holdings_for_user(user_id)?;
        let cached_positions = self.position_store.positions_for_user(user_id)?;
        debug!(
            "Building summary for user {} from {} holdings and {} positions",
            user_id,
            cached_holdings.len(),
            cached_positions.len()
        );

        let symbols: HashSet<String> = cached_holdings
            .iter()
            .map(|h| h.symbol.clone())
            .chain(cached_positions.iter().map(|p| p.symbol.clone()))
            .collect();
        let prices = self.fetch_prices_best_effort(&symbols).await;

        let mut holdings: Vec<HoldingView> = cached_holdings
            .iter()
            .map(|h| convert_holding(h, prices.get(&h.symbol)))
            .collect();
        let mut positions: Vec<PositionView> = cached_positions
            .iter()
            .map(|p| convert_position(p, prices.get(&p.symbol)))
            .collect();
        holdings.sort_by(|a, b| b.current_value.cmp(&a.current_value));
        positions.sort_by(|a, b| b.value.cmp(&a.value));

        let totals = compute_totals(&holdings, &positions);
        let contains_derivatives = cached_positions
            .iter()
            .any(|p| p.position_type == PositionType::Fno);

        let last_synced_at = match self.sync_log_repository.latest_successful_sync(user_id) {
            Ok(timestamp) => timestamp,
            Err(e) => {
                warn!(
                    "Could not read last successful sync for user {}: {}",
                    user_id, e
                );
                None
            }
        };

        Ok(PortfolioSummary {
            holdings,
            positions,
            totals,
            contains_derivatives,
            last_synced_at,
            as_of_date: business_date_today(),
        })
    }
}
