//! Polymarket API clients
//!
//! Provides the CLOB (trading) and CTF (conditional tokens) clients, plus
//! the EIP-712 signing layer shared between them.

pub mod auth;
pub mod clob;
pub mod ctf;

pub use auth::PolymarketAuth;
pub use clob::{RestClient, WebSocketClient, Market, Outcome, OrderBook, PriceLevel, Side, OrderType, OrderArgs, TradingClient, TradingError};
pub use ctf::{
    CtfClient, CtfError, CtfOperation, CtfOperationResult,
    split_via_safe, merge_via_safe, approve_via_safe,
    split, merge,
    usdc_to_raw, usdc_from_raw,
    USDC_DECIMALS, CTF_CONTRACT, NEG_RISK_CTF_CONTRACT, USDC_ADDRESS,
};
