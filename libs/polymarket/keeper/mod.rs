//! The automated market-making keeper for a binary prediction market on a
//! CLOB (C1-C7, A1-A6). See `SPEC_FULL.md` at the workspace root.

pub mod balances;
pub mod cli;
pub mod clob;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod gas;
pub mod lifecycle;
pub mod metrics;
pub mod price_feed;
pub mod strategies;

pub use engine::ReconciliationEngine;
pub use lifecycle::Lifecycle;
pub use metrics::Metrics;
pub use strategies::{Strategy, StrategyManager};
