//! Constant-product pool reserve state.

/// Two-asset constant-product pool `x · y = L²`.
///
/// Asset y is the numeraire, so the marginal price of x is `y / x` and the
/// invariant liquidity is `L = sqrt(x · y)`. L stays constant across swaps;
/// only explicit trade execution moves the reserves, and it moves them
/// along the invariant curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoolState {
    /// Reserve of the risky asset.
    pub reserve_x: f64,
    /// Reserve of the numeraire asset.
    pub reserve_y: f64,
}

impl PoolState {
    /// Pool holding `pool_value` of the numeraire in total, balanced at
    /// `price`: half the value on each side.
    pub fn from_value_and_price(pool_value: f64, price: f64) -> Self {
        let reserve_y = pool_value / 2.0;
        Self {
            reserve_x: reserve_y / price,
            reserve_y,
        }
    }

    /// Marginal pool price of x in units of y.
    pub fn price(&self) -> f64 {
        self.reserve_y / self.reserve_x
    }

    /// Invariant liquidity `L = sqrt(x · y)`.
    pub fn liquidity(&self) -> f64 {
        (self.reserve_x * self.reserve_y).sqrt()
    }

    /// Mark-to-market pool value at an external reference price.
    pub fn value_at(&self, price: f64) -> f64 {
        self.reserve_x * price + self.reserve_y
    }

    /// Applies a trade's reserve deltas.
    pub fn apply(&mut self, delta_x: f64, delta_y: f64) {
        self.reserve_x += delta_x;
        self.reserve_y += delta_y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_construction() {
        let pool = PoolState::from_value_and_price(1_000_000.0, 1_000.0);
        assert_eq!(pool.reserve_y, 500_000.0);
        assert_eq!(pool.reserve_x, 500.0);
        assert!((pool.price() - 1_000.0).abs() < 1e-9);
        assert!((pool.value_at(1_000.0) - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn invariant_preserved_along_curve() {
        let mut pool = PoolState::from_value_and_price(1_000_000.0, 1_000.0);
        let liquidity = pool.liquidity();

        // Move to a 2% higher price along the curve.
        let sqrt_target = (1_020.0f64).sqrt();
        let delta_x = liquidity / sqrt_target - pool.reserve_x;
        let delta_y = liquidity * sqrt_target - pool.reserve_y;
        pool.apply(delta_x, delta_y);

        let product = pool.reserve_x * pool.reserve_y;
        let relative_error = (product - liquidity * liquidity).abs() / (liquidity * liquidity);
        assert!(relative_error < 1e-9, "relative error {relative_error}");
        assert!((pool.price() - 1_020.0).abs() / 1_020.0 < 1e-9);
    }
}
