//! Inventory-risk running cost over the grid.

use nalgebra::DMatrix;

use crate::math::InventoryGrid;

/// Cost rate c(q) = -(gamma / 2) * q' Sigma q at every grid point, aligned
/// with the grid's linear order. Built once per parameter set.
#[derive(Debug, Clone)]
pub struct RunningCostField {
    values: Vec<f64>,
}

impl RunningCostField {
    pub fn new(grid: &InventoryGrid, gamma: f64, covariance: &DMatrix<f64>) -> Self {
        let d = grid.num_assets();
        let mut values = vec![0.0f64; grid.len()];
        let mut q = vec![0i64; d];
        for (index, value) in values.iter_mut().enumerate() {
            grid.coords_of(index, &mut q);
            let mut quadratic = 0.0;
            for i in 0..d {
                let qi = q[i] as f64;
                for j in 0..d {
                    quadratic += qi * covariance[(i, j)] * q[j] as f64;
                }
            }
            *value = -0.5 * gamma * quadratic;
        }
        Self { values }
    }

    /// Flat cost buffer in grid order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
