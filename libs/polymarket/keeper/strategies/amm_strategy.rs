//! Diffs the AMM's expected order set against the current book.
//!
//! Grounded on
//! `original_source/poly_market_maker/strategies/amm_strategy.py`'s
//! `AMMStrategy`/`OrderType`; `OrderType` itself now lives on `domain::order`
//! since the reconciliation engine needs the same identity.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::keeper::domain::order::quantize;
use crate::keeper::domain::{Order, OrderBook, OrderType, Token, MIN_SIZE};

use super::amm::{AmmConfig, AmmManager};

pub struct AmmStrategy {
    manager: AmmManager,
}

impl AmmStrategy {
    pub fn new(config: AmmConfig) -> Self {
        Self {
            manager: AmmManager::new(config),
        }
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

        let expected = self.manager.expected_orders(
            price_of(Token::A),
            price_of(Token::B),
            book.balances.token(Token::A).unwrap_or(Decimal::ZERO),
            book.balances.token(Token::B).unwrap_or(Decimal::ZERO),
            book.balances.collateral.unwrap_or(Decimal::ZERO),
        );

        let expected_types: HashSet<OrderType> = expected.iter().map(|o| o.order_type()).collect();

        let mut orders_to_cancel: Vec<Order> = book
            .orders
            .iter()
            .filter(|o| !expected_types.contains(&o.order_type()))
            .cloned()
            .collect();

        let mut orders_to_place = Vec::new();
        for order_type in &expected_types {
            let open_size: Decimal = book
                .orders
                .iter()
                .filter(|o| &o.order_type() == order_type)
                .map(|o| o.size)
                .sum();
            let expected_size: Decimal = expected
                .iter()
                .filter(|o| &o.order_type() == order_type)
                .map(|o| o.size)
                .sum();

            let new_size = if open_size > expected_size {
                orders_to_cancel.extend(
                    book.orders
                        .iter()
                        .filter(|o| &o.order_type() == order_type)
                        .cloned(),
                );
                expected_size
            } else {
                quantize(expected_size - open_size)
            };

            if new_size >= MIN_SIZE {
                orders_to_place.push(Order::new(
                    order_type.price,
                    new_size,
                    order_type.side,
                    order_type.token,
                ));
            }
        }

        (orders_to_cancel, orders_to_place)
    }
}
