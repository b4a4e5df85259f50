//! C6: loads the configured strategy and drives one synchronize tick.
//!
//! Grounded on
//! `original_source/poly_market_maker/strategies/strategy_manager.py`.
//! SPEC_FULL.md §9 mandates dispatch via an enum `match`, not a trait
//! object, since the strategy set is closed.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::keeper::domain::{OrderBook, Token};
use crate::keeper::engine::ReconciliationEngine;
use crate::keeper::metrics::Metrics;
use crate::keeper::price_feed::PriceFeed;

use super::amm::AmmConfig;
use super::amm_strategy::AmmStrategy;
use super::bands::Bands;
use super::bands_strategy::BandsStrategy;

pub enum Strategy {
    Bands(BandsStrategy),
    Amm(AmmStrategy),
}

impl Strategy {
    fn get_orders(
        &self,
        book: &OrderBook,
        target_prices: &[(Token, Decimal); 2],
    ) -> (Vec<crate::keeper::domain::Order>, Vec<crate::keeper::domain::Order>) {
        match self {
            Strategy::Bands(s) => s.get_orders(book, target_prices),
            Strategy::Amm(s) => s.get_orders(book, target_prices),
        }
    }
}

pub struct StrategyManager {
    strategy: Strategy,
    engine: Arc<ReconciliationEngine>,
    price_feed: Arc<dyn PriceFeed>,
    metrics: Arc<Metrics>,
}

impl StrategyManager {
    pub fn new(
        strategy: Strategy,
        engine: Arc<ReconciliationEngine>,
        price_feed: Arc<dyn PriceFeed>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            strategy,
            engine,
            price_feed,
            metrics,
        }
    }

    pub fn bands(bands: Bands, engine: Arc<ReconciliationEngine>, price_feed: Arc<dyn PriceFeed>, metrics: Arc<Metrics>) -> Self {
        Self::new(Strategy::Bands(BandsStrategy::new(bands)), engine, price_feed, metrics)
    }

    pub fn amm(config: AmmConfig, engine: Arc<ReconciliationEngine>, price_feed: Arc<dyn PriceFeed>, metrics: Arc<Metrics>) -> Self {
        Self::new(Strategy::Amm(AmmStrategy::new(config)), engine, price_feed, metrics)
    }

    /// One tick: read the snapshot, skip if balances are incomplete,
    /// compute cancels/places, dispatch cancels before places.
    pub async fn synchronize(&self) {
        self.metrics.strategy_tick();

        let book = self.engine.get_order_book().await;
        if !book.balances.is_complete() {
            debug!("balances invalid/incomplete, skipping this tick");
            self.metrics.strategy_tick_skipped();
            return;
        }
        if book.balances.is_all_zero() {
            debug!("collateral and both token balances are zero, skipping this tick");
            self.metrics.strategy_tick_skipped();
            return;
        }

        let price_a = round2(self.price_feed.get_price().await);
        let price_b = round2(Decimal::ONE - price_a);
        let target_prices = [(Token::A, price_a), (Token::B, price_b)];

        let (cancels, places) = self.strategy.get_orders(&book, &target_prices);

        if cancels.is_empty() && places.is_empty() {
            debug!("tick synchronized with nothing to do");
            return;
        }

        if !cancels.is_empty() {
            self.engine.cancel_orders(&cancels).await;
        }
        if !places.is_empty() {
            self.engine.place_orders(places).await;
        }
    }
}

fn round2(d: Decimal) -> Decimal {
    d.round_dp(crate::keeper::domain::MAX_DECIMALS)
}
