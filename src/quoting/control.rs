//! Closed-form quote extraction from the final transform field.

use crate::error::Result;
use crate::math::InventoryGrid;
use crate::quoting::transform::execution_adjustment;
use crate::quoting::{AssetSpec, QuoteControl};

/// Final transform field together with everything needed to read quote
/// distances off it at any inventory state. Pure and immutable once built.
#[derive(Debug, Clone)]
pub struct ControlField {
    grid: InventoryGrid,
    theta: Vec<f64>,
    assets: Vec<AssetSpec>,
    exec_risk_aversion: f64,
}

impl ControlField {
    pub(crate) fn new(
        grid: InventoryGrid,
        theta: Vec<f64>,
        assets: Vec<AssetSpec>,
        exec_risk_aversion: f64,
    ) -> Self {
        debug_assert_eq!(theta.len(), grid.len());
        Self {
            grid,
            theta,
            assets,
            exec_risk_aversion,
        }
    }

    pub fn grid(&self) -> &InventoryGrid {
        &self.grid
    }

    /// Final field theta(T, q) in grid order.
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Quote distances for every asset at an arbitrary inventory state.
    ///
    /// A side is `None` when the state has no room for the corresponding
    /// fill; other assets and the opposite side are still reported. An
    /// out-of-bounds state is a configuration error.
    pub fn quotes_at(&self, inventory: &[i64]) -> Result<Vec<QuoteControl>> {
        let index = self.grid.index_of(inventory)?;
        Ok(self.quotes_at_index(index))
    }

    /// Quote distances at the zero-inventory state. The index is derived
    /// from the configured bounds, not a fixed grid coordinate.
    pub fn zero_inventory_quotes(&self) -> Vec<QuoteControl> {
        self.quotes_at_index(self.grid.zero_index())
    }

    fn quotes_at_index(&self, index: usize) -> Vec<QuoteControl> {
        let xi = self.exec_risk_aversion;
        self.assets
            .iter()
            .enumerate()
            .map(|(axis, asset)| {
                let kappa = asset.intensity_decay;
                let eta = asset.base_intensity * execution_adjustment(xi, kappa);

                // delta = -(1/kappa) ln((xi + kappa) H / A) with
                // H = (eta / kappa) exp(-kappa (theta(q) - theta(q -+ e))).
                let distance = |neighbor: usize| {
                    let h = eta / kappa
                        * (-kappa * (self.theta[index] - self.theta[neighbor])).exp();
                    -((xi + kappa) * h / asset.base_intensity).ln() / kappa
                };

                let bid = if self.grid.can_bid(index, axis) {
                    Some(distance(self.grid.shift_up(index, axis)))
                } else {
                    None
                };
                let ask = if self.grid.can_ask(index, axis) {
                    Some(distance(self.grid.shift_down(index, axis)))
                } else {
                    None
                };
                QuoteControl { bid, ask }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn field_with_theta(bounds: &[u32], theta: Vec<f64>, assets: Vec<AssetSpec>) -> ControlField {
        let grid = InventoryGrid::new(bounds, 1 << 20).unwrap();
        assert_eq!(grid.len(), theta.len());
        ControlField::new(grid, theta, assets, 0.0)
    }

    #[test]
    fn boundary_states_report_missing_sides() {
        let assets = vec![AssetSpec {
            inventory_bound: 1,
            base_intensity: 1.0,
            intensity_decay: 2.0,
        }];
        let field = field_with_theta(&[1], vec![0.0; 3], assets);

        let long = field.quotes_at(&[1]).unwrap();
        assert!(long[0].bid.is_none());
        assert!(long[0].ask.is_some());

        let short = field.quotes_at(&[-1]).unwrap();
        assert!(short[0].bid.is_some());
        assert!(short[0].ask.is_none());

        assert!(field.quotes_at(&[2]).is_err());
    }

    #[test]
    fn flat_field_distances_match_closed_form() {
        // With theta constant the neighbor difference vanishes and, at
        // xi = 0, delta = -(1/kappa) ln(1/e) = 1 / kappa.
        let kappa = 2.0;
        let assets = vec![AssetSpec {
            inventory_bound: 1,
            base_intensity: 1.7,
            intensity_decay: kappa,
        }];
        let field = field_with_theta(&[1], vec![0.0; 3], assets);
        let quotes = field.zero_inventory_quotes();
        assert_relative_eq!(quotes[0].bid.unwrap(), 1.0 / kappa, epsilon = 1e-12);
        assert_relative_eq!(quotes[0].ask.unwrap(), 1.0 / kappa, epsilon = 1e-12);
    }

    #[test]
    fn skewed_field_skews_the_quotes() {
        // theta decreasing in q makes buying less attractive: the bid backs
        // away from mid and the ask tightens by the same amount.
        let kappa = 1.0;
        let assets = vec![AssetSpec {
            inventory_bound: 1,
            base_intensity: 1.0,
            intensity_decay: kappa,
        }];
        let field = field_with_theta(&[1], vec![0.2, 0.0, -0.2], assets);
        let quotes = field.zero_inventory_quotes();
        let flat = 1.0 / kappa;
        assert_relative_eq!(quotes[0].bid.unwrap(), flat + 0.2, epsilon = 1e-12);
        assert_relative_eq!(quotes[0].ask.unwrap(), flat - 0.2, epsilon = 1e-12);
    }
}
