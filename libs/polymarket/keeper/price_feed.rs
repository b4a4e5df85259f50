//! A3: resolves the target price for token A (token B is always its
//! complement, computed by the strategy manager).
//!
//! Grounded on `original_source/poly_market_maker/price_feed.py`'s
//! `PriceFeedClob`, generalized only by adding the jittered fallback the
//! distilled spec calls for on a failed lookup.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::warn;

use crate::infrastructure::client::clob::RestClient;

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// The current midpoint for token A, in `(0, 1)`.
    async fn get_price(&self) -> Decimal;
}

/// Queries the CLOB's `/midpoint` endpoint for token A; on any error, falls
/// back to a small random perturbation around 0.5 rather than stalling the
/// strategy tick.
pub struct ClobPriceFeed {
    rest: Arc<RestClient>,
    token_a_id: String,
}

impl ClobPriceFeed {
    pub fn new(rest: Arc<RestClient>, token_a_id: impl Into<String>) -> Self {
        Self {
            rest,
            token_a_id: token_a_id.into(),
        }
    }
}

#[async_trait]
impl PriceFeed for ClobPriceFeed {
    async fn get_price(&self) -> Decimal {
        match self.rest.get_midpoint(&self.token_a_id).await {
            Ok(mid) => Decimal::try_from(mid).unwrap_or_else(|_| jittered_default()),
            Err(err) => {
                warn!(%err, "price feed lookup failed, falling back to jittered default");
                jittered_default()
            }
        }
    }
}

fn jittered_default() -> Decimal {
    let jitter: f64 = rand::thread_rng().gen_range(-0.01..0.01);
    Decimal::try_from(0.5 + jitter).unwrap_or(Decimal::new(5, 1))
}
