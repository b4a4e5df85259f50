//! Order value type and the `OrderType` reconciliation identity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::token::Token;
use super::MAX_DECIMALS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// A resting or about-to-be-placed order.
///
/// `id` is absent until the venue assigns one on successful placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub price: Decimal,
    pub size: Decimal,
    pub side: Side,
    pub token: Token,
    #[serde(default)]
    pub id: Option<String>,
}

impl Order {
    pub fn new(price: Decimal, size: Decimal, side: Side, token: Token) -> Self {
        Self {
            price: quantize(price),
            size: quantize(size),
            side,
            token,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn order_type(&self) -> OrderType {
        OrderType {
            price: self.price,
            side: self.side,
            token: self.token,
        }
    }
}

/// Quantize a decimal to the tick size (`MAX_DECIMALS` places), rounding
/// to the nearest tick. Size quantization for sells additionally rounds
/// down at the call site (see `strategies::amm::round_down`).
pub fn quantize(value: Decimal) -> Decimal {
    value.round_dp(MAX_DECIMALS)
}

/// Round down to the tick size. Used for sizes so the engine never overstates
/// what it can actually post (the source's `math_round_down`).
pub fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MAX_DECIMALS, rust_decimal::RoundingStrategy::ToZero)
}

/// The reconciliation identity of an order: two orders are interchangeable
/// iff their `(price, side, token)` triples match. Sizes at the same type
/// are additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderType {
    pub price: Decimal,
    pub side: Side,
    pub token: Token,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn orders_of_equal_type_share_identity_regardless_of_size() {
        let a = Order::new(dec!(0.5), dec!(10), Side::Buy, Token::A);
        let b = Order::new(dec!(0.5), dec!(99), Side::Buy, Token::A);
        assert_eq!(a.order_type(), b.order_type());
    }

    #[test]
    fn round_down_never_rounds_up() {
        assert_eq!(round_down(dec!(1.239)), dec!(1.23));
        assert_eq!(round_down(dec!(1.231)), dec!(1.23));
    }
}
