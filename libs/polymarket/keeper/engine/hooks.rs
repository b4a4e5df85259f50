//! The narrow function contracts the reconciliation engine calls through.
//!
//! These are the "external collaborators" SPEC_FULL.md §1/§6 names: the CLOB
//! REST client and the balance reader implement them; the engine never knows
//! or cares how a hook is backed. Grounded on the trait-at-the-seam style of
//! `infrastructure/order_manager.rs`'s `MessageHandler`/`MessageRouter` pair.

use async_trait::async_trait;

use crate::keeper::domain::{Balances, Order, Side, Token};

/// Reads the keeper's own resting orders for one market.
#[async_trait]
pub trait OrdersSource: Send + Sync {
    /// Returns `None` on transient failure; the engine keeps its last good
    /// snapshot rather than treating this as "book is empty".
    async fn get_orders(&self) -> Option<Vec<Order>>;
}

/// Reads on-chain balances.
#[async_trait]
pub trait BalancesSource: Send + Sync {
    async fn get_balances(&self) -> Option<Balances>;
}

/// Places a single order at the venue.
#[async_trait]
pub trait OrderPlacer: Send + Sync {
    /// Returns the venue-assigned order id on success, `None` on failure.
    async fn place_order(&self, price: rust_decimal::Decimal, size: rust_decimal::Decimal, side: Side, token: Token) -> Option<String>;
}

/// Cancels orders at the venue.
#[async_trait]
pub trait OrderCanceller: Send + Sync {
    /// `true` on success. Passing an id that is already gone is a no-op
    /// returning `true` (per SPEC_FULL.md §6).
    async fn cancel_order(&self, order_id: &str) -> bool;

    async fn cancel_all_orders(&self) -> bool;
}
