//! C4: the bands (spread-maker) strategy's pure domain logic.
//!
//! Grounded on `original_source/poly_market_maker/strategies/bands.py`'s
//! `Band`/`Bands` classes, translated from float to `Decimal` arithmetic
//! quantized at the tick (SPEC_FULL.md §4.2, §9).

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::keeper::domain::order::quantize;
use crate::keeper::domain::{Order, Side, Token, MIN_SIZE, MIN_TICK};
use crate::keeper::errors::ConfigError;

/// One margin/size interval around a target price.
#[derive(Debug, Clone)]
pub struct Band {
    pub min_margin: Decimal,
    pub avg_margin: Decimal,
    pub max_margin: Decimal,
    pub min_amount: Decimal,
    pub avg_amount: Decimal,
    pub max_amount: Decimal,
}

impl Band {
    pub fn new(
        min_margin: Decimal,
        avg_margin: Decimal,
        max_margin: Decimal,
        min_amount: Decimal,
        avg_amount: Decimal,
        max_amount: Decimal,
    ) -> Result<Self, ConfigError> {
        if min_amount < Decimal::ZERO || min_amount > avg_amount || avg_amount > max_amount {
            return Err(ConfigError::InvalidBandMargins {
                min: min_margin.to_string(),
                max: max_margin.to_string(),
            });
        }
        if min_margin > avg_margin || avg_margin > max_margin || min_margin >= max_margin {
            return Err(ConfigError::InvalidBandMargins {
                min: min_margin.to_string(),
                max: max_margin.to_string(),
            });
        }
        Ok(Self {
            min_margin,
            avg_margin,
            max_margin,
            min_amount,
            avg_amount,
            max_amount,
        })
    }

    fn apply_margin(price: Decimal, margin: Decimal) -> Decimal {
        quantize(price - margin)
    }

    pub fn min_price(&self, target_price: Decimal) -> Decimal {
        Self::apply_margin(target_price, self.max_margin)
    }

    pub fn max_price(&self, target_price: Decimal) -> Decimal {
        Self::apply_margin(target_price, self.min_margin)
    }

    pub fn buy_price(&self, target_price: Decimal) -> Decimal {
        Self::apply_margin(target_price, self.avg_margin)
    }

    pub fn sell_price(&self, target_price: Decimal) -> Decimal {
        Self::apply_margin(Decimal::ONE - target_price, -self.avg_margin)
    }

    /// Whether `order` belongs to this band at `target_price`, after
    /// normalizing sell prices by their complement.
    pub fn includes(&self, order: &Order, target_price: Decimal) -> bool {
        let price = match order.side {
            Side::Buy => order.price,
            Side::Sell => quantize(Decimal::ONE - order.price),
        };
        price > self.min_price(target_price) && price <= self.max_price(target_price)
    }

    /// Orders in this band to cancel so the band's total size drops to
    /// `max_amount`. `orders` need not be pre-filtered to this band.
    pub fn excessive_orders(
        &self,
        orders: &[Order],
        target_price: Decimal,
        is_first_band: bool,
        is_last_band: bool,
    ) -> Vec<Order> {
        let mut in_band: Vec<Order> = orders
            .iter()
            .filter(|o| self.includes(o, target_price))
            .cloned()
            .collect();

        if is_first_band {
            in_band.sort_by(|a, b| {
                (b.price - target_price)
                    .abs()
                    .cmp(&(a.price - target_price).abs())
            });
        } else if is_last_band {
            in_band.sort_by(|a, b| {
                (a.price - target_price)
                    .abs()
                    .cmp(&(b.price - target_price).abs())
            });
        } else {
            in_band.sort_by(|a, b| a.size.cmp(&b.size));
        }

        let mut band_amount: Decimal = in_band.iter().map(|o| o.size).sum();
        let mut cancelled = Vec::new();
        while band_amount > self.max_amount {
            if let Some(order) = in_band.pop() {
                band_amount -= order.size;
                cancelled.push(order);
            } else {
                break;
            }
        }

        if !cancelled.is_empty() {
            info!(
                min_margin = %self.min_margin,
                max_margin = %self.max_margin,
                count = cancelled.len(),
                "band over max_amount, scheduling cancellations"
            );
        }

        cancelled
    }
}

/// The full set of configured bands for one market.
#[derive(Debug, Clone)]
pub struct Bands {
    bands: Vec<Band>,
}

impl Bands {
    pub fn new(bands: Vec<Band>) -> Result<Self, ConfigError> {
        for (i, a) in bands.iter().enumerate() {
            for (j, b) in bands.iter().enumerate() {
                if i != j && a.min_margin < b.max_margin && b.min_margin < a.max_margin {
                    return Err(ConfigError::OverlappingBands(i, j));
                }
            }
        }
        Ok(Self { bands })
    }

    /// Drop bands that would require a non-positive price, clamping
    /// `avg_margin` on any band whose buy price would fall to or below
    /// zero so it lands exactly on `MIN_TICK` instead.
    fn virtual_bands(&self, target_price: Decimal) -> Vec<Band> {
        if target_price <= Decimal::ZERO {
            return Vec::new();
        }

        self.bands
            .iter()
            .filter(|band| band.max_price(target_price) > Decimal::ZERO)
            .cloned()
            .map(|mut band| {
                if band.buy_price(target_price) <= Decimal::ZERO {
                    band.avg_margin = target_price - MIN_TICK;
                }
                band
            })
            .collect()
    }

    fn excessive_orders(&self, orders: &[Order], bands: &[Band], target_price: Decimal) -> Vec<Order> {
        let mut out = Vec::new();
        for (i, band) in bands.iter().enumerate() {
            out.extend(band.excessive_orders(
                orders,
                target_price,
                i == 0,
                i == bands.len() - 1,
            ));
        }
        out
    }

    fn outside_any_band_orders(&self, orders: &[Order], bands: &[Band], target_price: Decimal) -> Vec<Order> {
        orders
            .iter()
            .filter(|o| !bands.iter().any(|b| b.includes(o, target_price)))
            .cloned()
            .inspect(|o| debug!(?o.id, "order doesn't belong to any band, scheduling cancellation"))
            .collect()
    }

    /// Orders to cancel: those over their band's max, plus any order that
    /// falls in no band at all.
    pub fn cancellable_orders(&self, orders: &[Order], target_price: Decimal) -> Vec<Order> {
        let bands = self.virtual_bands(target_price);
        let mut cancel = self.excessive_orders(orders, &bands, target_price);
        cancel.extend(self.outside_any_band_orders(orders, &bands, target_price));
        cancel
    }

    /// New sell/buy orders so every under-filled band reaches `avg_amount`,
    /// subject to the collateral/token balances passed in. The sell-then-buy
    /// commitment within one band is sequential (DESIGN.md decision 6).
    pub fn new_orders(
        &self,
        orders: &[Order],
        mut collateral_balance: Decimal,
        mut token_balance: Decimal,
        target_price: Decimal,
        buy_token: Token,
    ) -> Vec<Order> {
        let sell_token = buy_token.complement();
        let mut new_orders = Vec::new();

        for band in self.virtual_bands(target_price) {
            let mut band_amount: Decimal = orders
                .iter()
                .filter(|o| band.includes(o, target_price))
                .map(|o| o.size)
                .sum();

            if band_amount >= band.min_amount {
                continue;
            }

            let sell_price = band.sell_price(target_price);
            let sell_size = quantize((band.avg_amount - band_amount).min(token_balance));
            if let Some(order) = new_order(sell_price, sell_size, Side::Sell, sell_token) {
                band_amount += sell_size;
                token_balance -= sell_size;
                new_orders.push(order);
            }

            if band_amount < band.avg_amount {
                let buy_price = band.buy_price(target_price);
                let buy_size = quantize(
                    (band.avg_amount - band_amount).min(collateral_balance / buy_price),
                );
                if let Some(order) = new_order(buy_price, buy_size, Side::Buy, buy_token) {
                    collateral_balance -= buy_size * buy_price;
                    new_orders.push(order);
                }
            }
        }

        new_orders
    }
}

fn new_order(price: Decimal, size: Decimal, side: Side, token: Token) -> Option<Order> {
    if price > Decimal::ZERO && price < Decimal::ONE && size >= MIN_SIZE {
        Some(Order::new(price, size, side, token))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::domain::Token;
    use rust_decimal_macros::dec;

    fn one_band() -> Bands {
        Bands::new(vec![Band::new(
            dec!(0.02),
            dec!(0.03),
            dec!(0.04),
            dec!(10),
            dec!(20),
            dec!(50),
        )
        .unwrap()])
        .unwrap()
    }

    #[test]
    fn overlapping_bands_are_rejected() {
        let bands = vec![
            Band::new(dec!(0.0), dec!(0.02), dec!(0.04), dec!(10), dec!(20), dec!(50)).unwrap(),
            Band::new(dec!(0.03), dec!(0.05), dec!(0.07), dec!(10), dec!(20), dec!(50)).unwrap(),
        ];
        assert!(Bands::new(bands).is_err());
    }

    /// S1: balanced replenishment with no existing token balance.
    #[test]
    fn replenishment_skips_sell_when_no_token_balance() {
        let bands = one_band();
        let existing = vec![Order::new(dec!(0.48), dec!(5), Side::Buy, Token::A)];
        let placed = bands.new_orders(&existing, dec!(100), dec!(0), dec!(0.5), Token::A);

        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].side, Side::Buy);
        assert_eq!(placed[0].price, dec!(0.47));
        assert_eq!(placed[0].size, dec!(15));
    }

    /// S2: with token balance, both a sell (complement) and a buy are placed.
    #[test]
    fn replenishment_places_sell_and_buy_when_balances_allow() {
        let bands = one_band();
        let existing = vec![Order::new(dec!(0.48), dec!(5), Side::Buy, Token::A)];
        let placed = bands.new_orders(&existing, dec!(30), dec!(30), dec!(0.5), Token::A);

        let sell = placed.iter().find(|o| o.side == Side::Sell).unwrap();
        assert_eq!(sell.token, Token::B);
        assert_eq!(sell.price, dec!(0.53));
        assert_eq!(sell.size, dec!(15));

        let buy = placed.iter().find(|o| o.side == Side::Buy).unwrap();
        assert_eq!(buy.token, Token::A);
        assert_eq!(buy.price, dec!(0.47));
    }

    /// S3: a low target price forces a virtual band with a clamped buy price.
    #[test]
    fn virtual_band_clamps_avg_margin_to_keep_buy_price_positive() {
        let bands = one_band();
        let placed = bands.new_orders(&[], dec!(100), dec!(0), dec!(0.04), Token::A);
        for order in &placed {
            assert!(order.price > Decimal::ZERO);
            assert!(order.price < Decimal::ONE);
        }
    }

    #[test]
    fn new_order_below_min_size_is_suppressed() {
        assert!(new_order(dec!(0.5), dec!(1), Side::Buy, Token::A).is_none());
    }
}
