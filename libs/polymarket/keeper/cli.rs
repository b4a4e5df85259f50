//! A6: the keeper binary's command-line surface (SPEC_FULL.md §6).

use clap::Parser;

use super::gas::GasStrategyKind;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StrategyKind {
    Amm,
    Bands,
}

#[derive(Parser, Debug)]
#[command(name = "keeper", about = "Automated market-making keeper for a binary prediction market")]
pub struct Cli {
    /// Wallet private key used to sign CLOB orders and on-chain approvals.
    #[arg(long, env = "PRIVATE_KEY")]
    pub private_key: String,

    /// Polygon JSON-RPC endpoint.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,

    /// Base URL of the CLOB REST API.
    #[arg(long, env = "CLOB_API_URL")]
    pub clob_api_url: String,

    /// The binary market's condition id.
    #[arg(long, env = "CONDITION_ID")]
    pub condition_id: String,

    /// Which pricing strategy to run.
    #[arg(long, value_enum)]
    pub strategy: StrategyKind,

    /// Path to the strategy's JSON config file.
    #[arg(long)]
    pub strategy_config: std::path::PathBuf,

    /// Seconds between strategy synchronize ticks.
    #[arg(long, default_value_t = 30)]
    pub sync_interval: u64,

    /// Seconds between order/balance refresh cycles.
    #[arg(long, default_value_t = 5)]
    pub refresh_frequency: u64,

    /// Concurrent place/cancel workers.
    #[arg(long, default_value_t = 1)]
    pub worker_pool_size: usize,

    /// Gas price strategy for on-chain transactions.
    #[arg(long, value_enum, default_value = "web3")]
    pub gas_strategy: GasStrategyKind,

    /// Gas station HTTP endpoint (required when `--gas-strategy station`).
    #[arg(long)]
    pub gas_station_url: Option<String>,

    /// Fixed gas price in wei (used by `--gas-strategy fixed`).
    #[arg(long)]
    pub fixed_gas_price: Option<u64>,

    /// Port the `/metrics` HTTP endpoint listens on.
    #[arg(long, default_value_t = 9008)]
    pub metrics_server_port: u16,

    /// EVM chain id (Polygon mainnet by default).
    #[arg(long, default_value_t = 137)]
    pub chain_id: u64,

    /// Log level, also overridable via `RUST_LOG`.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
