//! Per-component error taxonomy. Every component that can fail fatally owns
//! its own `thiserror` enum; transient failures are caught and absorbed where
//! they occur and never reach these types (see SPEC_FULL.md §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read strategy config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse strategy config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("bands {0} and {1} have overlapping margin intervals")]
    OverlappingBands(usize, usize),

    #[error("band margin interval is invalid: min_margin {min} must be < max_margin {max}")]
    InvalidBandMargins { min: String, max: String },

    #[error("AMM config invalid: {0}")]
    InvalidAmmConfig(String),

    #[error("unknown strategy {0:?}, expected \"amm\" or \"bands\"")]
    UnknownStrategy(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("order book has not been populated by a refresh yet")]
    NotYetInitialized,
}

#[derive(Error, Debug)]
pub enum ClobError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum BalanceReadError {
    #[error("RPC call failed: {0}")]
    Rpc(String),
}
