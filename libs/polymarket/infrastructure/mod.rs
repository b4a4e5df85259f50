//! Infrastructure Layer
//!
//! Contains implementations of external interfaces (API clients, logging).
//! This layer depends on the domain layer but not on the application layer.

pub mod client;
pub mod logging;

// Re-export commonly used types from client
pub use client::{
    clob::{Market, OrderArgs, OrderBook, OrderType, Outcome, PriceLevel, RestClient, Side, WebSocketClient},
    PolymarketAuth,
    ctf::{
        CtfClient, CtfError, CtfOperation, CtfOperationResult,
        split_via_safe, merge_via_safe, approve_via_safe,
        split, merge,
        usdc_to_raw, usdc_from_raw,
        USDC_DECIMALS,
    },
};

// Re-export infrastructure services
pub use crate::utils::Heartbeat;
pub use logging::{init_tracing, init_tracing_with_level};
pub use crate::utils::ShutdownManager;
