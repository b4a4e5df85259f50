//! C4/C5/C6: the pluggable pricing strategies and their dispatcher.

pub mod amm;
pub mod amm_strategy;
pub mod bands;
pub mod bands_strategy;
pub mod manager;

pub use manager::{Strategy, StrategyManager};
