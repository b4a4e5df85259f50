//! A1: the CLOB-backed implementation of the engine's hook traits.
//!
//! Composes the existing `RestClient` + `PolymarketAuth` + `OrderBuilder`
//! rather than adding a second HTTP layer. Order parsing follows
//! `infrastructure/active_order_manager.rs::ActiveOrder::from_json` (the
//! venue's open-order rows are untyped `serde_json::Value`, C.f.
//! `client/clob/types.rs`'s `OpenOrder = serde_json::Value`).

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::Address;
use rust_decimal::Decimal;
use tracing::warn;

use crate::infrastructure::client::auth::PolymarketAuth;
use crate::infrastructure::client::clob::order_builder::OrderBuilder;
use crate::infrastructure::client::clob::types::{OpenOrderParams, OrderType as ApiOrderType};
use crate::infrastructure::client::clob::RestClient;

use super::domain::{Order, Side, Token};
use super::engine::{OrderCanceller, OrderPlacer, OrdersSource};

/// Resolves which of the two outcome tokens a venue asset id denotes.
pub struct TokenIds {
    pub a: String,
    pub b: String,
}

impl TokenIds {
    fn token_of(&self, asset_id: &str) -> Option<Token> {
        if asset_id == self.a {
            Some(Token::A)
        } else if asset_id == self.b {
            Some(Token::B)
        } else {
            None
        }
    }

    fn id_of(&self, token: Token) -> &str {
        match token {
            Token::A => &self.a,
            Token::B => &self.b,
        }
    }
}

/// The CLOB client wrapper: reads/places/cancels orders for one condition.
pub struct ClobClient {
    rest: Arc<RestClient>,
    auth: PolymarketAuth,
    order_builder: OrderBuilder,
    tokens: TokenIds,
    condition_id: String,
}

impl ClobClient {
    pub fn new(
        rest: Arc<RestClient>,
        auth: PolymarketAuth,
        order_builder: OrderBuilder,
        tokens: TokenIds,
        condition_id: impl Into<String>,
    ) -> Self {
        Self {
            rest,
            auth,
            order_builder,
            tokens,
            condition_id: condition_id.into(),
        }
    }

    fn parse_open_order(&self, value: &serde_json::Value) -> Option<Order> {
        let asset_id = value.get("asset_id")?.as_str()?;
        let token = self.tokens.token_of(asset_id)?;
        let side_str = value.get("side")?.as_str()?;
        let side = match side_str.to_ascii_uppercase().as_str() {
            "BUY" => Side::Buy,
            "SELL" => Side::Sell,
            _ => return None,
        };
        let price: Decimal = value.get("price")?.as_str()?.parse().ok()?;
        let original_size: Decimal = value.get("original_size")?.as_str()?.parse().ok()?;
        let size_matched: Decimal = value
            .get("size_matched")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(Decimal::ZERO);
        let id = value.get("id")?.as_str()?.to_string();

        Some(Order::new(price, original_size - size_matched, side, token).with_id(id))
    }
}

#[async_trait]
impl OrdersSource for ClobClient {
    async fn get_orders(&self) -> Option<Vec<Order>> {
        let params = OpenOrderParams {
            market: Some(self.condition_id.clone()),
            ..Default::default()
        };
        match self.rest.get_all_orders(&self.auth, Some(&params)).await {
            Ok(raw) => Some(
                raw.iter()
                    .filter_map(|v| self.parse_open_order(v))
                    .collect(),
            ),
            Err(err) => {
                warn!(%err, "failed to fetch open orders");
                None
            }
        }
    }
}

#[async_trait]
impl OrderPlacer for ClobClient {
    async fn place_order(&self, price: Decimal, size: Decimal, side: Side, token: Token) -> Option<String> {
        let token_id = self.tokens.id_of(token);
        let api_side = match side {
            Side::Buy => crate::infrastructure::client::clob::Side::Buy,
            Side::Sell => crate::infrastructure::client::clob::Side::Sell,
        };

        let price_f64 = price.to_string().parse::<f64>().ok()?;
        let size_f64 = size.to_string().parse::<f64>().ok()?;

        match self
            .rest
            .place_signed_order(
                &self.auth,
                &self.order_builder,
                token_id,
                price_f64,
                size_f64,
                api_side,
                ApiOrderType::GTC,
                None,
            )
            .await
        {
            Ok(resp) if resp.success => resp.order_id,
            Ok(resp) => {
                warn!(?resp.error_msg, "order placement rejected by venue");
                None
            }
            Err(err) => {
                warn!(%err, "order placement request failed");
                None
            }
        }
    }
}

#[async_trait]
impl OrderCanceller for ClobClient {
    async fn cancel_order(&self, order_id: &str) -> bool {
        match self.rest.cancel_order(&self.auth, order_id).await {
            Ok(resp) => resp.not_canceled.get(order_id).is_none(),
            Err(err) => {
                warn!(%err, order_id, "cancel request failed");
                false
            }
        }
    }

    async fn cancel_all_orders(&self) -> bool {
        match self.rest.cancel_all_orders(&self.auth).await {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "cancel-all request failed");
                false
            }
        }
    }
}

/// Parses an `0x`-prefixed hex address, used for the wallet/maker pair the
/// order builder signs with.
pub fn parse_address(s: &str) -> Option<Address> {
    Address::from_str(s).ok()
}
