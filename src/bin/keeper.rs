//! Keeper binary entry point.
//!
//! Wires the CLI surface (`keeper::cli::Cli`) into the venue clients, the
//! reconciliation engine, and the strategy manager, then hands the whole
//! thing to `Lifecycle::run`. Mirrors `sniper.rs`'s load-config-then-run
//! shape but with `clap` in place of the arb bot's env/positional parsing.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ethers::providers::{Http, Provider};
use ethers::types::U256;
use tracing::info;
use tracing_subscriber::EnvFilter;

use polymarket::infrastructure::client::auth::PolymarketAuth;
use polymarket::infrastructure::client::clob::order_builder::OrderBuilder;
use polymarket::infrastructure::client::clob::{Market, RestClient};
use polymarket::infrastructure::client::ctf::{CTF_CONTRACT, NEG_RISK_CTF_CONTRACT, USDC_ADDRESS};
use polymarket::keeper::balances::OnchainBalances;
use polymarket::keeper::cli::{Cli, StrategyKind};
use polymarket::keeper::clob::{ClobClient, TokenIds};
use polymarket::keeper::config;
use polymarket::keeper::gas::GasStation;
use polymarket::keeper::metrics::{self, Metrics};
use polymarket::keeper::price_feed::{ClobPriceFeed, PriceFeed};
use polymarket::keeper::{Lifecycle, ReconciliationEngine, StrategyManager};

const STARTUP_FAILURE: i32 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::error!(%err, "keeper failed to start");
            std::process::exit(STARTUP_FAILURE);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut auth =
        PolymarketAuth::new(&cli.private_key, cli.chain_id).context("invalid private key")?;
    let wallet_address = auth.address().context("auth has no signing wallet")?;

    let rest = Arc::new(RestClient::new(cli.clob_api_url.clone()));
    rest.ensure_connectivity()
        .await
        .context("could not reach CLOB API")?;

    let api_creds = rest
        .get_or_create_api_creds(&auth)
        .await
        .context("failed to derive CLOB API credentials")?;
    auth.set_api_key(api_creds);

    let market = rest
        .get_market(&cli.condition_id)
        .await
        .context("failed to fetch market")?;
    let [token_a, token_b] = resolve_outcomes(&market)?;
    let neg_risk = rest
        .get_neg_risk(&token_a.id)
        .await
        .unwrap_or(false);

    info!(condition_id = %cli.condition_id, token_a = %token_a.id, token_b = %token_b.id, neg_risk, "resolved market");

    let order_builder = OrderBuilder::new(wallet_address, wallet_address, cli.chain_id, neg_risk);

    let position_id_a = U256::from_dec_str(&token_a.id).context("token A id is not numeric")?;
    let position_id_b = U256::from_dec_str(&token_b.id).context("token B id is not numeric")?;

    let tokens = TokenIds {
        a: token_a.id.clone(),
        b: token_b.id.clone(),
    };
    let clob_client = Arc::new(ClobClient::new(
        rest.clone(),
        auth,
        order_builder,
        tokens,
        cli.condition_id.clone(),
    ));

    let provider = Provider::<Http>::try_from(cli.rpc_url.as_str()).context("invalid RPC URL")?;
    let balances = Arc::new(OnchainBalances::new(
        Arc::new(provider.clone()),
        USDC_ADDRESS,
        if neg_risk { NEG_RISK_CTF_CONTRACT } else { CTF_CONTRACT },
        &format!("{:?}", wallet_address),
        position_id_a,
        position_id_b,
    ));

    // Gas pricing only matters for on-chain transactions; this keeper never
    // submits any (trading is entirely off-chain via the CLOB), but the
    // station is kept wired for the approval flows the original bot runs
    // out-of-band via `ctf.rs`.
    let _gas_station = GasStation::new(
        cli.gas_strategy,
        Some(provider),
        cli.gas_station_url.clone(),
        cli.fixed_gas_price,
    );

    let metrics_handle = Arc::new(Metrics::new());

    let engine = Arc::new(ReconciliationEngine::new(
        clob_client.clone(),
        balances,
        clob_client.clone(),
        clob_client,
        metrics_handle.clone(),
        Duration::from_secs(cli.refresh_frequency),
        cli.worker_pool_size,
    ));

    metrics::serve(metrics_handle.clone(), engine.clone(), cli.metrics_server_port);

    let price_feed: Arc<dyn PriceFeed> = Arc::new(ClobPriceFeed::new(rest, token_a.id.clone()));

    let manager = Arc::new(match cli.strategy {
        StrategyKind::Bands => {
            let bands = config::load_bands(&cli.strategy_config)
                .context("failed to load bands strategy config")?;
            let bands = polymarket::keeper::strategies::bands::Bands::new(bands)
                .context("bands config failed validation")?;
            StrategyManager::bands(bands, engine.clone(), price_feed, metrics_handle)
        }
        StrategyKind::Amm => {
            let amm = config::load_amm(&cli.strategy_config)
                .context("failed to load AMM strategy config")?;
            StrategyManager::amm(amm, engine.clone(), price_feed, metrics_handle)
        }
    });

    let lifecycle = Lifecycle::new();
    lifecycle
        .run(
            engine,
            manager,
            Duration::from_secs(cli.sync_interval),
            Duration::from_secs(0),
        )
        .await;

    Ok(())
}

struct ResolvedOutcome {
    id: String,
}

fn resolve_outcomes(market: &Market) -> Result<[ResolvedOutcome; 2]> {
    if market.outcomes.len() != 2 {
        bail!(
            "expected exactly two outcomes for a binary market, found {}",
            market.outcomes.len()
        );
    }
    Ok([
        ResolvedOutcome {
            id: market.outcomes[0].id.clone(),
        },
        ResolvedOutcome {
            id: market.outcomes[1].id.clone(),
        },
    ])
}

