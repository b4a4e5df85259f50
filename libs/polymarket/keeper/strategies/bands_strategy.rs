//! Driver that feeds one market's orders through `Bands` twice per token:
//! once to find cancellations, once to find replenishment orders.
//!
//! Grounded on `original_source/poly_market_maker/strategies/bands_strategy.py`.

use rust_decimal::Decimal;

use crate::keeper::domain::{Order, OrderBook, Side, Token};
use crate::keeper::errors::ConfigError;

use super::bands::Bands;

pub struct BandsStrategy {
    bands: Bands,
}

impl BandsStrategy {
    pub fn new(bands: Bands) -> Self {
        Self { bands }
    }

    pub fn from_config(bands_config: Vec<super::bands::Band>) -> Result<Self, ConfigError> {
        Ok(Self::new(Bands::new(bands_config)?))
    }

    pub fn get_orders(
        &self,
        book: &OrderBook,
        target_prices: &[(Token, Decimal); 2],
    ) -> (Vec<Order>, Vec<Order>) {
        let price_of = |token: Token| {
            target_prices
                .iter()
                .find(|(t, _)| *t == token)
                .map(|(_, p)| *p)
                .expect("both tokens must have a target price")
        };

        let mut orders_to_cancel = Vec::new();
        for token in [Token::A, Token::B] {
            let orders = orders_by_corresponding_buy_token(&book.orders, token);
            orders_to_cancel.extend(self.bands.cancellable_orders(&orders, price_of(token)));
        }

        let open_after_cancel: Vec<&Order> = book
            .orders
            .iter()
            .filter(|o| !orders_to_cancel.iter().any(|c| c.id == o.id))
            .collect();
        let balance_locked_by_open_buys: Decimal = open_after_cancel
            .iter()
            .filter(|o| o.side == Side::Buy)
            .map(|o| o.size * o.price)
            .sum();

        let collateral = book.balances.collateral.unwrap_or(Decimal::ZERO);
        let mut free_collateral_balance = collateral - balance_locked_by_open_buys;

        let mut orders_to_place = Vec::new();
        for token in [Token::A, Token::B] {
            let orders = orders_by_corresponding_buy_token(&book.orders, token);

            let balance_locked_by_open_sells: Decimal = orders
                .iter()
                .filter(|o| o.side == Side::Sell)
                .map(|o| o.size)
                .sum();
            let free_token_balance = book
                .balances
                .token(token.complement())
                .unwrap_or(Decimal::ZERO)
                - balance_locked_by_open_sells;

            let new_orders = self.bands.new_orders(
                &orders,
                free_collateral_balance,
                free_token_balance,
                price_of(token),
                token,
            );

            free_collateral_balance -= new_orders
                .iter()
                .filter(|o| o.side == Side::Buy)
                .map(|o| o.size * o.price)
                .sum::<Decimal>();

            orders_to_place.extend(new_orders);
        }

        (orders_to_cancel, orders_to_place)
    }
}

/// Orders "belonging" to `buy_token`'s book side: its own BUY orders, and
/// SELL orders on its complement (which free up collateral for this token's
/// buy side when filled).
fn orders_by_corresponding_buy_token(orders: &[Order], buy_token: Token) -> Vec<Order> {
    orders
        .iter()
        .filter(|o| {
            (o.side == Side::Buy && o.token == buy_token)
                || (o.side == Side::Sell && o.token != buy_token)
        })
        .cloned()
        .collect()
}
