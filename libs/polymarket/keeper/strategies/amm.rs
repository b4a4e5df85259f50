//! C5: the AMM (grid-maker) strategy's pure domain logic.
//!
//! Grounded on `original_source/poly_market_maker/strategies/amm.py`'s
//! `AMM`/`AMMManager`. The closed-form inverse-sqrt size formulas are
//! evaluated in `f64` (SPEC_FULL.md §9 permits this for intermediates) and
//! only the final per-order sizes and grid prices are quantized back to
//! `Decimal` at the tick.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::keeper::domain::order::{quantize, round_down};
use crate::keeper::domain::{Order, Side, Token};

#[derive(Debug, Clone, Copy)]
pub struct AmmConfig {
    pub p_min: Decimal,
    pub p_max: Decimal,
    pub spread: Decimal,
    pub delta: Decimal,
    pub depth: Decimal,
    pub max_collateral: Decimal,
}

/// A single token's concentrated-liquidity grid, parameterized by the
/// current midpoint.
struct Amm {
    token: Token,
    config: AmmConfig,
    p_i: Decimal,
    p_u: Decimal,
    p_l: Decimal,
    buy_prices: Vec<Decimal>,
    sell_prices: Vec<Decimal>,
}

impl Amm {
    fn new(token: Token, config: AmmConfig, p_i: Decimal) -> Self {
        // A raw price-feed midpoint can land outside [p_min, p_max] (e.g. a
        // skewed CLOB quote); clamp it so the buy/sell grids never come out
        // empty, which `phi()` requires.
        let p_i = p_i.clamp(config.p_min, config.p_max);
        let p_u = quantize((p_i + config.depth).min(config.p_max));
        let p_l = quantize((p_i - config.depth).max(config.p_min));

        let mut buy_prices = Vec::new();
        let mut price = quantize(p_i - config.spread);
        while price >= p_l {
            buy_prices.push(price);
            price = quantize(price - config.delta);
        }

        let mut sell_prices = Vec::new();
        let mut price = quantize(p_i + config.spread);
        while price <= p_u {
            sell_prices.push(price);
            price = quantize(price + config.delta);
        }

        Self {
            token,
            config,
            p_i,
            p_u,
            p_l,
            buy_prices,
            sell_prices,
        }
    }

    fn f(d: Decimal) -> f64 {
        d.to_f64().expect("grid prices/balances fit in f64")
    }

    fn sell_size(&self, x: f64, p_t: Decimal) -> f64 {
        let (p_i, p_u, p_t) = (Self::f(self.p_i), Self::f(self.p_u), Self::f(p_t));
        let l = x / (1.0 / p_i.sqrt() - 1.0 / p_u.sqrt());
        l / p_u.sqrt() - l / p_t.sqrt() + x
    }

    fn buy_size(&self, y: f64, p_t: Decimal) -> f64 {
        let (p_i, p_l, p_t) = (Self::f(self.p_i), Self::f(self.p_l), Self::f(p_t));
        let l = y / (p_i.sqrt() - p_l.sqrt());
        l * (1.0 / p_t.sqrt() - 1.0 / p_i.sqrt())
    }

    /// Effective marginal collateral consumption at the first (lowest)
    /// buy-grid price, used by `collateral_allocation`.
    fn phi(&self) -> f64 {
        let Some(p_top) = self.buy_prices.first() else {
            // Midpoint sits within `spread` of `p_l`: there's no room for a
            // buy grid. No marginal collateral goes to this token's buys.
            return 0.0;
        };
        let (p_i, p_l, p_top) = (Self::f(self.p_i), Self::f(self.p_l), Self::f(*p_top));
        (1.0 / (p_i.sqrt() - p_l.sqrt())) * (1.0 / p_top.sqrt() - 1.0 / p_i.sqrt())
    }

    fn sell_orders(&self, x: Decimal) -> Vec<Order> {
        let x = Self::f(x);
        let cumulative: Vec<f64> = self.sell_prices.iter().map(|p| self.sell_size(x, *p)).collect();
        diff(&cumulative)
            .into_iter()
            .zip(self.sell_prices.iter())
            .filter_map(|(size, price)| {
                let size = round_down(Decimal::try_from(size).ok()?);
                (size > Decimal::ZERO).then(|| Order::new(*price, size, Side::Sell, self.token))
            })
            .collect()
    }

    fn buy_orders(&self, y: Decimal) -> Vec<Order> {
        let y = Self::f(y);
        let cumulative: Vec<f64> = self.buy_prices.iter().map(|p| self.buy_size(y, *p)).collect();
        diff(&cumulative)
            .into_iter()
            .zip(self.buy_prices.iter())
            .filter_map(|(size, price)| {
                let size = round_down(Decimal::try_from(size).ok()?);
                (size > Decimal::ZERO).then(|| Order::new(*price, size, Side::Buy, self.token))
            })
            .collect()
    }
}

fn diff(arr: &[f64]) -> Vec<f64> {
    arr.iter()
        .enumerate()
        .map(|(i, v)| if i == 0 { *v } else { v - arr[i - 1] })
        .collect()
}

/// Drives both tokens' grids together so their collateral split is
/// consistent, grounded on `AMMManager`.
pub struct AmmManager {
    config: AmmConfig,
}

impl AmmManager {
    pub fn new(config: AmmConfig) -> Self {
        Self { config }
    }

    pub fn expected_orders(
        &self,
        p_a: Decimal,
        p_b: Decimal,
        x_a: Decimal,
        x_b: Decimal,
        collateral_balance: Decimal,
    ) -> Vec<Order> {
        let amm_a = Amm::new(Token::A, self.config, p_a);
        let amm_b = Amm::new(Token::B, self.config, p_b);

        let sell_orders_a = amm_a.sell_orders(x_a);
        let sell_orders_b = amm_b.sell_orders(x_b);

        let y = collateral_balance.min(self.config.max_collateral);
        let (y_a, y_b) = Self::collateral_allocation(
            &amm_a,
            &amm_b,
            y,
            first_size(&sell_orders_a),
            first_size(&sell_orders_b),
        );

        let buy_orders_a = amm_a.buy_orders(y_a);
        let buy_orders_b = amm_b.buy_orders(y_b);

        [sell_orders_a, sell_orders_b, buy_orders_a, buy_orders_b].concat()
    }

    fn collateral_allocation(
        amm_a: &Amm,
        amm_b: &Amm,
        y: Decimal,
        first_sell_a: Decimal,
        first_sell_b: Decimal,
    ) -> (Decimal, Decimal) {
        let (phi_a, phi_b) = (amm_a.phi(), amm_b.phi());
        let y_f = Amm::f(y);
        let numerator = Amm::f(first_sell_a) - Amm::f(first_sell_b) + y_f * phi_b;
        let mut y_a = numerator / (phi_a + phi_b);

        if y_a < 0.0 {
            y_a = 0.0;
        } else if y_a > y_f {
            y_a = y_f;
        }
        let y_a = round_down(Decimal::try_from(y_a).unwrap_or(Decimal::ZERO));
        let y_b = round_down(y - y_a);

        (y_a, y_b)
    }
}

fn first_size(orders: &[Order]) -> Decimal {
    orders
        .iter()
        .min_by_key(|o| o.price)
        .map(|o| o.size)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> AmmConfig {
        AmmConfig {
            p_min: dec!(0.05),
            p_max: dec!(0.95),
            spread: dec!(0.01),
            delta: dec!(0.01),
            depth: dec!(0.05),
            max_collateral: dec!(200),
        }
    }

    /// S4: grid length/bounds for p_i = 0.5.
    #[test]
    fn grid_has_expected_length_and_bounds() {
        let amm = Amm::new(Token::A, config(), dec!(0.5));
        assert_eq!(amm.sell_prices, vec![dec!(0.51), dec!(0.52), dec!(0.53), dec!(0.54), dec!(0.55)]);
        assert_eq!(amm.buy_prices, vec![dec!(0.49), dec!(0.48), dec!(0.47), dec!(0.46), dec!(0.45)]);
    }

    #[test]
    fn sell_sizes_are_non_negative_and_monotonic_in_price() {
        let amm = Amm::new(Token::A, config(), dec!(0.5));
        let orders = amm.sell_orders(dec!(1000));
        for o in &orders {
            assert!(o.size >= Decimal::ZERO);
        }
    }

    #[test]
    fn expected_orders_splits_collateral_between_tokens() {
        let manager = AmmManager::new(config());
        let orders = manager.expected_orders(dec!(0.5), dec!(0.5), dec!(1000), dec!(1000), dec!(200));
        assert!(orders.iter().any(|o| o.token == Token::A && o.side == Side::Buy));
        assert!(orders.iter().any(|o| o.token == Token::B && o.side == Side::Buy));
    }
}
