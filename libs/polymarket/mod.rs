//! Polymarket Trading Bot
//!
//! Venue clients for Polymarket's CLOB and conditional-tokens contracts, and
//! the automated market-making keeper built on top of them.

// Core layers (Clean Architecture)
pub mod domain;
pub mod infrastructure;

// The market-making keeper (C1-C7, A1-A6)
pub mod keeper;
pub mod utils;

// Re-export commonly used items from infrastructure
pub use infrastructure::{
    PolymarketAuth,
    client::clob::{RestClient, WebSocketClient, Market, Outcome, OrderBook, PriceLevel, Side, OrderType, OrderArgs},
};

// Re-export utils from infrastructure for backward compatibility
pub use infrastructure::{init_tracing, Heartbeat, ShutdownManager};
