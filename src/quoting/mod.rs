//! Optimal quoting: model parameters, the running-cost field, the
//! exponential-transform ODE solve, and closed-form quote extraction.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub mod control;
pub mod engine;
pub mod running_cost;
pub mod transform;

pub use control::ControlField;
pub use engine::{OptimalControlEngine, QuoteSheet};
pub use running_cost::RunningCostField;
pub use transform::{IntensityTransformSolver, XI_EPS};

/// Per-asset quoting parameters.
///
/// `base_intensity` and `intensity_decay` parameterize the Poisson fill
/// model lambda(delta) = A * exp(-kappa * delta); both come from an external
/// calibration. `inventory_bound` caps the absolute inventory the maker is
/// willing to hold in the asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    /// Inventory bound Q, at least 1.
    pub inventory_bound: u32,
    /// Base arrival intensity A, strictly positive.
    pub base_intensity: f64,
    /// Intensity decay kappa, strictly positive.
    pub intensity_decay: f64,
}

/// Portfolio-level model parameters shared by all assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Price-risk aversion gamma, non-negative.
    pub price_risk_aversion: f64,
    /// Execution-risk aversion xi, non-negative.
    pub exec_risk_aversion: f64,
    /// Quoting horizon T, strictly positive.
    pub horizon: f64,
    /// Covariance of instantaneous price changes of the quoted assets'
    /// risk factors; d x d, symmetric, positive semi-definite.
    pub covariance: DMatrix<f64>,
}

/// Optimal quote distances from mid for one asset.
///
/// A side is `None` when the corresponding fill would push inventory out of
/// bounds at the queried state; the caller combines defined sides with a
/// mid-price as (mid - bid, mid + ask).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteControl {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

/// Tolerances and budgets for the transform-field integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub rel_tol: f64,
    pub abs_tol: f64,
    /// Hard cap on attempted integration steps.
    pub max_steps: usize,
    /// Hard cap on inventory grid points; grid size is exponential in the
    /// number of assets.
    pub max_grid_points: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rel_tol: 1e-8,
            abs_tol: 1e-10,
            max_steps: 200_000,
            max_grid_points: 1 << 20,
        }
    }
}

/// Statistics from the transform-field integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverDiagnostics {
    pub steps_accepted: usize,
    pub steps_rejected: usize,
    pub rhs_evaluations: usize,
    /// Scaled local error estimate of the final accepted step.
    pub final_error_estimate: f64,
}
