//! C3: the order-book reconciliation engine.

pub mod hooks;
pub mod reconciler;
pub mod state;

pub use hooks::{BalancesSource, OrderCanceller, OrderPlacer, OrdersSource};
pub use reconciler::ReconciliationEngine;
