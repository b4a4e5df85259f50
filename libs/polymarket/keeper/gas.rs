//! A4: selects the gas price attached to any signed on-chain transaction
//! the keeper submits (approvals; this keeper does not submit trading
//! transactions itself — trading is off-chain via the CLOB).
//!
//! Ported from `original_source/poly_market_maker/gas.py`'s `GasStation`;
//! the three strategies keep their Python names and fallback-to-fixed
//! behavior on error.

use ethers::providers::Middleware;
use ethers::types::U256;
use serde::Deserialize;
use tracing::error;

const DEFAULT_FIXED_GAS_PRICE_WEI: u64 = 100_000_000_000;
const GWEI: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum GasStrategyKind {
    Fixed,
    Station,
    Web3,
}

#[derive(Deserialize)]
struct GasStationResponse {
    fast: f64,
}

/// Resolves a gas price for one transaction, falling back to the
/// configured fixed price if the chosen strategy's lookup fails.
pub struct GasStation<M> {
    kind: GasStrategyKind,
    provider: Option<M>,
    station_url: Option<String>,
    fixed: U256,
    http: reqwest::Client,
}

impl<M: Middleware> GasStation<M> {
    pub fn new(
        kind: GasStrategyKind,
        provider: Option<M>,
        station_url: Option<String>,
        fixed_gas_price_wei: Option<u64>,
    ) -> Self {
        Self {
            kind,
            provider,
            station_url,
            fixed: U256::from(fixed_gas_price_wei.unwrap_or(DEFAULT_FIXED_GAS_PRICE_WEI)),
            http: reqwest::Client::new(),
        }
    }

    pub async fn gas_price(&self) -> U256 {
        match self.kind {
            GasStrategyKind::Fixed => self.fixed,
            GasStrategyKind::Web3 => self.web3_gas_price().await,
            GasStrategyKind::Station => self.station_gas_price().await,
        }
    }

    /// Rounds up to the nearest gwei to avoid "transaction underpriced".
    async fn web3_gas_price(&self) -> U256 {
        let Some(provider) = &self.provider else {
            error!("web3 gas strategy selected with no provider, using fixed price");
            return self.fixed;
        };

        match provider.get_gas_price().await {
            Ok(gas) => {
                let gwei = gas.as_u64().div_ceil(GWEI);
                U256::from(gwei * GWEI)
            }
            Err(err) => {
                error!(%err, "error fetching gas from web3, returning configured fixed gas price");
                self.fixed
            }
        }
    }

    async fn station_gas_price(&self) -> U256 {
        let Some(url) = &self.station_url else {
            error!("station gas strategy selected with no URL, using fixed price");
            return self.fixed;
        };

        match self.fetch_station_gas(url).await {
            Ok(gas) => gas,
            Err(err) => {
                error!(%err, "error fetching gas from gasstation, returning configured fixed gas price");
                self.fixed
            }
        }
    }

    async fn fetch_station_gas(&self, url: &str) -> Result<U256, reqwest::Error> {
        let resp: GasStationResponse = self.http.get(url).send().await?.json().await?;
        Ok(U256::from(resp.fast.ceil() as u64) * U256::from(GWEI))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_strategy_returns_configured_price() {
        let station: GasStation<ethers::providers::Provider<ethers::providers::Http>> =
            GasStation::new(GasStrategyKind::Fixed, None, None, Some(42_000_000_000));
        assert_eq!(station.gas_price().await, U256::from(42_000_000_000u64));
    }

    #[tokio::test]
    async fn web3_without_provider_falls_back_to_fixed() {
        let station: GasStation<ethers::providers::Provider<ethers::providers::Http>> =
            GasStation::new(GasStrategyKind::Web3, None, None, None);
        assert_eq!(
            station.gas_price().await,
            U256::from(DEFAULT_FIXED_GAS_PRICE_WEI)
        );
    }
}
