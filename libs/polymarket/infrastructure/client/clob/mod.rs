//! CLOB (Central Limit Order Book) API client and types
//!
//! Provides REST and WebSocket clients for trading on Polymarket.

pub mod rest;
pub mod types;
pub mod orderbook;
pub mod constants;
pub mod helpers;
pub mod order_builder;
pub mod trading;

pub use rest::RestClient;
pub use hypersockets::WebSocketClient;
pub use types::*;
pub use trading::TradingClient;
pub use constants::POLYGON_CHAIN_ID;
