//! A2: reads on-chain balances over a JSON-RPC provider.
//!
//! Grounded on `infrastructure/client/ctf.rs`'s `abigen!`-generated contract
//! bindings; collateral is plain ERC-20, the two outcome tokens are
//! ERC-1155 positions of the conditional-tokens contract.

use std::str::FromStr;
use std::sync::Arc;

use ethers::contract::abigen;
use ethers::prelude::*;
use rust_decimal::Decimal;
use tracing::warn;

use super::domain::Balances;

/// USDC (collateral) has 6 decimal places on Polygon.
const COLLATERAL_DECIMALS: u32 = 6;

abigen!(
    Erc20,
    r#"[
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

abigen!(
    ConditionalTokens,
    r#"[
        function balanceOf(address account, uint256 id) external view returns (uint256)
    ]"#
);

/// Reads Collateral/A/B balances for one wallet over an `ethers` provider.
pub struct OnchainBalances<M: Middleware> {
    collateral: Erc20<M>,
    ctf: ConditionalTokens<M>,
    account: Address,
    position_id_a: U256,
    position_id_b: U256,
}

impl<M: Middleware + 'static> OnchainBalances<M> {
    pub fn new(
        provider: Arc<M>,
        collateral_address: &str,
        ctf_address: &str,
        account: &str,
        position_id_a: U256,
        position_id_b: U256,
    ) -> Self {
        let collateral_address = Address::from_str(collateral_address).expect("valid address");
        let ctf_address = Address::from_str(ctf_address).expect("valid address");
        let account = Address::from_str(account).expect("valid address");

        Self {
            collateral: Erc20::new(collateral_address, provider.clone()),
            ctf: ConditionalTokens::new(ctf_address, provider),
            account,
            position_id_a,
            position_id_b,
        }
    }

    async fn read_collateral(&self) -> Option<Decimal> {
        match self.collateral.balance_of(self.account).call().await {
            Ok(raw) => Some(raw_to_decimal(raw, COLLATERAL_DECIMALS)),
            Err(err) => {
                warn!(%err, "collateral balance read failed");
                None
            }
        }
    }

    async fn read_position(&self, position_id: U256) -> Option<Decimal> {
        match self.ctf.balance_of(self.account, position_id).call().await {
            Ok(raw) => Some(raw_to_decimal(raw, COLLATERAL_DECIMALS)),
            Err(err) => {
                warn!(%err, %position_id, "position balance read failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl<M: Middleware + 'static> super::engine::BalancesSource for OnchainBalances<M> {
    /// Any single failed read yields `None` for that key only; the other
    /// two keys are still returned (SPEC_FULL.md §6).
    async fn get_balances(&self) -> Option<Balances> {
        let (collateral, a, b) = tokio::join!(
            self.read_collateral(),
            self.read_position(self.position_id_a),
            self.read_position(self.position_id_b)
        );

        Some(Balances { collateral, a, b })
    }
}

fn raw_to_decimal(raw: U256, decimals: u32) -> Decimal {
    let raw = Decimal::from_str(&raw.to_string()).unwrap_or(Decimal::ZERO);
    raw / Decimal::from(10u64.pow(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn raw_to_decimal_divides_by_token_decimals() {
        assert_eq!(raw_to_decimal(U256::from(1_500_000u64), 6), dec!(1.5));
        assert_eq!(raw_to_decimal(U256::zero(), 6), dec!(0));
    }
}
