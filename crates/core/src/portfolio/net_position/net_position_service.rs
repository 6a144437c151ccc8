//! Net position aggregation service.

use async_trait::async_trait;
use log::{debug, error, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::brokers::{Broker, CachedHolding, CachedPosition, PositionStoreTrait, PositionType};
use crate::constants::PERCENT_DECIMAL_PRECISION;
use crate::errors::Result;
use crate::market_data::{MarketPrice, MarketPriceProviderTrait};
use crate::portfolio::net_position::net_position_model::{
    DerivativeBasis, EquityBasis, NetPosition,
};

#[async_trait]
pub trait NetPositionServiceTrait: Send + Sync {
    /// Merges all of a user's cached holdings and positions into one row per
    /// symbol, valued against a single batched price fetch.
    async fn merge_positions(&self, user_id: &str) -> Result<Vec<NetPosition>>;
}

pub struct NetPositionService {
    position_store: Arc<dyn PositionStoreTrait>,
    price_provider: Arc<dyn MarketPriceProviderTrait>,
}

/// Per-symbol working state while merging rows.
#[derive(Default)]
struct SymbolAccumulator {
    broker_quantities: HashMap<Broker, Decimal>,
    total_quantity: Decimal,
    equity: EquityBasis,
    derivative: DerivativeBasis,
    is_derivative: bool,
}

impl SymbolAccumulator {
    fn add_holding(&mut self, holding: &CachedHolding) {
        *self
            .broker_quantities
            .entry(holding.broker)
            .or_insert(Decimal::ZERO) += holding.quantity;
        self.total_quantity += holding.quantity;
        // Holdings are never derivatives.
        self.equity.add(holding.quantity, holding.average_price);
    }

    fn add_position(&mut self, position: &CachedPosition) {
        *self
            .broker_quantities
            .entry(position.broker)
            .or_insert(Decimal::ZERO) += position.quantity;
        self.total_quantity += position.quantity;
        match position.position_type {
            PositionType::Fno => {
                self.is_derivative = true;
                self.derivative.add(position.quantity, position.buy_price);
            }
            PositionType::Delivery => {
                self.equity.add(position.quantity, position.buy_price);
            }
            // Intraday rows contribute exposure, not a carried cost basis.
            PositionType::Intraday => {}
        }
    }
}

impl NetPositionService {
    pub fn new(
        position_store: Arc<dyn PositionStoreTrait>,
        price_provider: Arc<dyn MarketPriceProviderTrait>,
    ) -> Self {
        Self {
            position_store,
            price_provider,
        }
    }

    /// Single batched price fetch for the aggregation. A failed feed degrades
    /// every affected row to a zero valuation instead of failing the request.
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

fn build_net_position(
    symbol: String,
    acc: SymbolAccumulator,
    price: Option<&MarketPrice>,
) -> NetPosition {
    if price.is_none() {
        warn!("No market price for {}. Valuing at zero.", symbol);
    }
    let current_price = price.map(|p| p.last_price).unwrap_or(Decimal::ZERO);
    let previous_close = price.map(|p| p.prev_close).unwrap_or(Decimal::ZERO);

    // The equity basis wins whenever any delivery quantity exists; the
    // derivative basis only speaks for pure-FNO symbols.
    let (average_buy_price, invested_value, basis_quantity) =
        if let Some(avg) = acc.equity.weighted_average() {
            (avg, acc.equity.invested(), acc.equity.quantity())
        } else if let Some(avg) = acc.derivative.weighted_average() {
            (avg, acc.derivative.invested(), acc.derivative.quantity())
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        };

    let current_value = acc.total_quantity * current_price;
    let unrealized_pnl = (current_price - average_buy_price) * basis_quantity;

    // A zero previous close or current price would manufacture a spurious
    // swing for newly listed or stale symbols; report zero instead.
    let (day_gain, day_gain_pct) = if current_price.is_zero() || previous_close.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let gain = (current_price - previous_close) * acc.total_quantity;
        let pct = ((current_price - previous_close) / previous_close * dec!(100))
            .round_dp(PERCENT_DECIMAL_PRECISION);
        (gain, pct)
    };

    let (mtm_pnl, derivative_day_gain, derivative_day_gain_pct) = if acc.is_derivative {
        let deriv_quantity = acc.derivative.quantity();
        let deriv_average = acc.derivative.weighted_average().unwrap_or(Decimal::ZERO);
        let mtm = (current_price - deriv_average) * deriv_quantity;

        let (gain, gain_pct) = if current_price.is_zero() || previous_close.is_zero() {
            (None, None)
        } else {
            let gain = (current_price - previous_close) * deriv_quantity;
            let invested = acc.derivative.invested();
            let pct = if invested.is_zero() {
                None
            } else {
                Some((gain / invested * dec!(100)).round_dp(PERCENT_DECIMAL_PRECISION))
            };
            (Some(gain), pct)
        };
        (Some(mtm), gain, gain_pct)
    } else {
        (None, None, None)
    };

    NetPosition {
        symbol,
        broker_quantities: acc.broker_quantities,
        total_quantity: acc.total_quantity,
        average_buy_price,
        current_price,
        previous_close,
        invested_value,
        current_value,
        unrealized_pnl,
        day_gain,
        day_gain_pct,
        is_derivative: acc.is_derivative,
        mtm_pnl,
        derivative_day_gain,
        derivative_day_gain_pct,
    }
}

#[async_trait]
impl NetPositionServiceTrait for NetPositionService {
    async fn merge_positions(&self, user_id: &str) -> Result<Vec<NetPosition>> {
        let holdings = self.position_store.holdings_for_user(user_id)?;
        let positions = self.position_store.positions_for_user(user_id)?;
        debug!(
            "Merging {} holdings and {} positions for user {}",
            holdings.len(),
            positions.len(),
            user_id
        );

        let mut by_symbol: HashMap<String, SymbolAccumulator> = HashMap::new();
        for holding in &holdings {
            by_symbol
                .entry(holding.symbol.clone())
                .or_default()
                .add_holding(holding);
        }
        for position in &positions {
            by_symbol
                .entry(position.symbol.clone())
                .or_default()
                .add_position(position);
        }

        let symbols: HashSet<String> = by_symbol.keys().cloned().collect();
        let prices = self.fetch_prices_best_effort(&symbols).await;

        let mut rows: Vec<NetPosition> = by_symbol
            .into_iter()
            .map(|(symbol, acc)| {
                let price = prices.get(&symbol);
                build_net_position(symbol, acc, price)
            })
            .collect();
        rows.sort_by(|a, b| b.current_value.cmp(&a.current_value));

        Ok(rows)
    }
}
