//! Value types shared by every keeper component: tokens, orders, balances,
//! and the immutable order book snapshot (C1, C2).

pub mod balances;
pub mod order;
pub mod orderbook;
pub mod token;

pub use balances::Balances;
pub use order::{Order, OrderType, Side};
pub use orderbook::OrderBook;
pub use token::Token;

/// The venue's minimum order size.
pub const MIN_SIZE: rust_decimal::Decimal = rust_decimal::Decimal::from_parts(15, 0, 0, false, 0);

/// The minimum price increment.
pub const MAX_DECIMALS: u32 = 2;

/// Smallest representable positive price, used to clamp bands away from zero.
pub const MIN_TICK: rust_decimal::Decimal = rust_decimal::Decimal::from_parts(1, 0, 0, false, 2);
