//! Immutable order book snapshot handed to strategies each tick.

use super::balances::Balances;
use super::order::Order;

/// `(orders, balances, orders_being_placed, orders_being_cancelled)`.
///
/// The two flags mean "there exists at least one in-flight op of that kind";
/// strategies may use them to gate placement if they choose to, though the
/// manager itself does not currently do so.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub orders: Vec<Order>,
    pub balances: Balances,
    pub orders_being_placed: bool,
    pub orders_being_cancelled: bool,
}

impl OrderBook {
    pub fn new(
        orders: Vec<Order>,
        balances: Balances,
        orders_being_placed: bool,
        orders_being_cancelled: bool,
    ) -> Self {
        Self {
            orders,
            balances,
            orders_being_placed,
            orders_being_cancelled,
        }
    }
}
