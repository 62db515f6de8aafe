//! Exponential value-transform field.
//!
//! The multi-asset control problem is nonlinear in the value function, but
//! the Cole-Hopf-style substitution theta turns it into a field with
//! additive source terms that integrates forward from theta(0, .) = 0:
//!
//! ```text
//! dtheta(q)/dt = c(q) + sum_i [ 1{q in CanBid_i} H_b(q, i)
//!                             + 1{q in CanAsk_i} H_a(q, i) ]
//! H_b(q, i) = (A_i Xi_i / kappa_i) exp(-kappa_i (theta(q) - theta(q + e_i)))
//! H_a(q, i) = (A_i Xi_i / kappa_i) exp(-kappa_i (theta(q) - theta(q - e_i)))
//! ```
//!
//! The closed-form quote extraction in [`crate::quoting::control`] reads the
//! same H terms off the final field.

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::math::{DormandPrince45, InventoryGrid};
use crate::quoting::{AssetSpec, RunningCostField, SolverDiagnostics, SolverSettings};

/// Below this execution-risk aversion the general adjustment formula is
/// numerically unusable and the closed-form xi -> 0 limit applies.
pub const XI_EPS: f64 = 1e-12;

/// Execution-cost adjustment Xi for one asset.
///
/// Xi = (1 + xi/kappa)^(-(1 + kappa/xi)) for xi above [`XI_EPS`]; the
/// expression blows up as xi -> 0 while its limit is exactly 1/e, so the
/// two branches are kept separate rather than unified.
pub fn execution_adjustment(xi: f64, kappa: f64) -> f64 {
    if xi > XI_EPS {
        (1.0 + xi / kappa).powf(-(1.0 + kappa / xi))
    } else {
        (-1.0f64).exp()
    }
}

/// Integrates the transform field over the inventory grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityTransformSolver {
    pub settings: SolverSettings,
}

impl IntensityTransformSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Integrate theta from 0 to `horizon` and return the final field with
    /// integration statistics. The field is discarded on failure.
    pub fn solve(
        &self,
        grid: &InventoryGrid,
        cost: &RunningCostField,
        assets: &[AssetSpec],
        exec_risk_aversion: f64,
        horizon: f64,
    ) -> Result<(Vec<f64>, SolverDiagnostics)> {
        let d = grid.num_assets();
        let n = grid.len();

        // eta_i = A_i * Xi_i; the per-fill source scale is eta_i / kappa_i.
        let scale: Vec<f64> = assets
            .iter()
            .map(|a| {
                a.base_intensity * execution_adjustment(exec_risk_aversion, a.intensity_decay)
                    / a.intensity_decay
            })
            .collect();
        let kappa: Vec<f64> = assets.iter().map(|a| a.intensity_decay).collect();

        debug!(
            grid_points = n,
            assets = d,
            rel_tol = self.settings.rel_tol,
            abs_tol = self.settings.abs_tol,
            "integrating transform field"
        );

        let rhs = |_t: f64, y: &[f64], dy: &mut [f64]| {
            dy.copy_from_slice(cost.values());
            for axis in 0..d {
                let s = scale[axis];
                let k = kappa[axis];
                for index in 0..n {
                    if grid.can_bid(index, axis) {
                        let up = grid.shift_up(index, axis);
                        // Buy fill at q, and the matching sell fill at q + e_i.
                        dy[index] += s * (-k * (y[index] - y[up])).exp();
                        dy[up] += s * (-k * (y[up] - y[index])).exp();
                    }
                }
            }
        };

        let integrator = DormandPrince45::new(
            self.settings.rel_tol,
            self.settings.abs_tol,
            self.settings.max_steps,
        );
        let solution = integrator
            .integrate(rhs, (0.0, horizon), vec![0.0; n])
            .map_err(|e| EngineError::Numerical {
                elapsed: e.elapsed(),
                last_step: e.last_step(),
                steps: e.steps(),
            })?;

        debug!(
            steps_accepted = solution.steps_accepted,
            steps_rejected = solution.steps_rejected,
            "transform field integrated"
        );

        let diagnostics = SolverDiagnostics {
            steps_accepted: solution.steps_accepted,
            steps_rejected: solution.steps_rejected,
            rhs_evaluations: solution.rhs_evaluations,
            final_error_estimate: solution.final_error,
        };
        Ok((solution.y, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::dmatrix;

    #[test]
    fn execution_adjustment_converges_to_inverse_e() {
        let limit = (-1.0f64).exp();
        // The general branch approaches 1/e from below as xi shrinks.
        let mut last_gap = f64::INFINITY;
        for xi in [1e-4, 1e-6, 1e-8] {
            let gap = (execution_adjustment(xi, 2.0) - limit).abs();
            assert!(gap < last_gap);
            last_gap = gap;
        }
        assert_abs_diff_eq!(execution_adjustment(1e-8, 2.0), limit, epsilon = 1e-6);
        // At or below the tolerance the closed-form limit is used verbatim.
        assert_eq!(execution_adjustment(0.0, 2.0), limit);
        assert_eq!(execution_adjustment(XI_EPS, 2.0), limit);
    }

    #[test]
    fn field_stays_symmetric_for_symmetric_inputs() {
        // d = 1, even cost: theta(q) must equal theta(-q) at the horizon.
        let grid = InventoryGrid::new(&[2], 1 << 20).unwrap();
        let sigma = dmatrix![1.0];
        let cost = RunningCostField::new(&grid, 0.3, &sigma);
        let assets = [AssetSpec {
            inventory_bound: 2,
            base_intensity: 1.0,
            intensity_decay: 1.5,
        }];
        let solver = IntensityTransformSolver::default();
        let (theta, diag) = solver.solve(&grid, &cost, &assets, 0.0, 2.0).unwrap();

        for q in 0..=2i64 {
            let plus = grid.index_of(&[q]).unwrap();
            let minus = grid.index_of(&[-q]).unwrap();
            // Mirrored states accumulate their source terms in a different
            // order, so agreement is to rounding, not bitwise.
            assert_relative_eq!(theta[plus], theta[minus], epsilon = 1e-9);
        }
        assert!(diag.steps_accepted > 0);
    }

    #[test]
    fn budget_exhaustion_is_a_numerical_failure() {
        let grid = InventoryGrid::new(&[1], 1 << 20).unwrap();
        let sigma = dmatrix![1.0];
        let cost = RunningCostField::new(&grid, 0.1, &sigma);
        let assets = [AssetSpec {
            inventory_bound: 1,
            base_intensity: 1.0,
            intensity_decay: 2.0,
        }];
        let solver = IntensityTransformSolver::new(SolverSettings {
            max_steps: 2,
            ..SolverSettings::default()
        });
        let err = solver.solve(&grid, &cost, &assets, 0.0, 3.0).unwrap_err();
        match err {
            crate::error::EngineError::Numerical { elapsed, steps, .. } => {
                assert!(elapsed < 3.0);
                assert!(steps <= 2);
            }
            other => panic!("expected numerical failure, got {other}"),
        }
    }
}
