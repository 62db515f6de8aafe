//! Engine facade: input validation and orchestration of the grid, cost
//! field, transform solve, and quote extraction.

use nalgebra::DMatrix;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::math::InventoryGrid;
use crate::quoting::{
    AssetSpec, ControlField, IntensityTransformSolver, ModelParameters, QuoteControl,
    RunningCostField, SolverDiagnostics, SolverSettings,
};

/// Maximum relative asymmetry tolerated in the covariance matrix.
const SYMMETRY_TOL: f64 = 1e-9;
/// Most negative eigenvalue tolerated, relative to the largest magnitude.
const PSD_TOL: f64 = 1e-8;

/// One optimal-control snapshot: zero-inventory quote distances per asset,
/// solver statistics, and the full field for off-zero queries.
#[derive(Debug, Clone)]
pub struct QuoteSheet {
    /// Per-asset (bid, ask) distances at zero inventory, in input order.
    pub quotes: Vec<QuoteControl>,
    pub diagnostics: SolverDiagnostics,
    /// Final transform field; `field.quotes_at` serves other inventories.
    pub field: ControlField,
}

/// Computes optimal quote distances for a fixed parameter set and horizon.
///
/// Stateless apart from solver settings; independent computations share
/// nothing and may run concurrently from the outside.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalControlEngine {
    settings: SolverSettings,
}

impl OptimalControlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Validate inputs, integrate the transform field, and extract per-asset
    /// quote distances at zero inventory.
    ///
    /// Validation failures short-circuit before any integration work. A
    /// numerical failure aborts the whole computation; no partial result is
    /// ever returned.
    pub fn compute(&self, assets: &[AssetSpec], params: &ModelParameters) -> Result<QuoteSheet> {
        validate_assets(assets)?;
        validate_parameters(assets.len(), params)?;

        let bounds: Vec<u32> = assets.iter().map(|a| a.inventory_bound).collect();
        let grid = InventoryGrid::new(&bounds, self.settings.max_grid_points)?;
        debug!(
            assets = assets.len(),
            grid_points = grid.len(),
            horizon = params.horizon,
            "starting optimal control computation"
        );

        let cost = RunningCostField::new(&grid, params.price_risk_aversion, &params.covariance);
        let solver = IntensityTransformSolver::new(self.settings);
        let (theta, diagnostics) = solver.solve(
            &grid,
            &cost,
            assets,
            params.exec_risk_aversion,
            params.horizon,
        )?;

        let field = ControlField::new(grid, theta, assets.to_vec(), params.exec_risk_aversion);
        let quotes = field.zero_inventory_quotes();
        info!(
            steps = diagnostics.steps_accepted,
            rejected = diagnostics.steps_rejected,
            "optimal controls computed"
        );

        Ok(QuoteSheet {
            quotes,
            diagnostics,
            field,
        })
    }
}

fn validate_assets(assets: &[AssetSpec]) -> Result<()> {
    if assets.is_empty() {
        return Err(EngineError::Configuration(
            "at least one asset is required".to_string(),
        ));
    }
    for (i, asset) in assets.iter().enumerate() {
        if asset.inventory_bound < 1 {
            return Err(EngineError::Configuration(format!(
                "asset {}: inventory bound must be at least 1",
                i
            )));
        }
        if !(asset.base_intensity > 0.0) || !asset.base_intensity.is_finite() {
            return Err(EngineError::Configuration(format!(
                "asset {}: base intensity must be positive and finite, got {}",
                i, asset.base_intensity
            )));
        }
        if !(asset.intensity_decay > 0.0) || !asset.intensity_decay.is_finite() {
            return Err(EngineError::Configuration(format!(
                "asset {}: intensity decay must be positive and finite, got {}",
                i, asset.intensity_decay
            )));
        }
    }
    Ok(())
}

fn validate_parameters(num_assets: usize, params: &ModelParameters) -> Result<()> {
    if !(params.price_risk_aversion >= 0.0) || !params.price_risk_aversion.is_finite() {
        return Err(EngineError::Configuration(format!(
            "price risk aversion must be non-negative and finite, got {}",
            params.price_risk_aversion
        )));
    }
    if !(params.exec_risk_aversion >= 0.0) || !params.exec_risk_aversion.is_finite() {
        return Err(EngineError::Configuration(format!(
            "execution risk aversion must be non-negative and finite, got {}",
            params.exec_risk_aversion
        )));
    }
    if !(params.horizon > 0.0) || !params.horizon.is_finite() {
        return Err(EngineError::Configuration(format!(
            "quoting horizon must be positive and finite, got {}",
            params.horizon
        )));
    }
    validate_covariance(num_assets, &params.covariance)
}

fn validate_covariance(num_assets: usize, covariance: &DMatrix<f64>) -> Result<()> {
    if covariance.nrows() != num_assets || covariance.ncols() != num_assets {
        return Err(EngineError::Configuration(format!(
            "covariance matrix is {}x{}, expected {}x{}",
            covariance.nrows(),
            covariance.ncols(),
            num_assets,
            num_assets
        )));
    }
    let mut max_abs = 0.0f64;
    let mut max_asym = 0.0f64;
    for i in 0..num_assets {
        for j in 0..num_assets {
            let v = covariance[(i, j)];
            if !v.is_finite() {
                return Err(EngineError::Configuration(
                    "covariance matrix contains non-finite entries".to_string(),
                ));
            }
            max_abs = max_abs.max(v.abs());
            max_asym = max_asym.max((v - covariance[(j, i)]).abs());
        }
    }
    if max_asym > SYMMETRY_TOL * max_abs.max(1.0) {
        return Err(EngineError::Configuration(format!(
            "covariance matrix is not symmetric (max asymmetry {:.3e})",
            max_asym
        )));
    }

    // Eigenvalues of the symmetrized matrix decide semi-definiteness.
    let symmetrized = (covariance + covariance.transpose()) * 0.5;
    let eigenvalues = symmetrized.symmetric_eigen().eigenvalues;
    let max_eig = eigenvalues.iter().fold(0.0f64, |m, &e| m.max(e.abs()));
    let min_eig = eigenvalues.iter().fold(f64::INFINITY, |m, &e| m.min(e));
    if min_eig < -PSD_TOL * max_eig.max(1.0) {
        return Err(EngineError::Configuration(format!(
            "covariance matrix is not positive semi-definite (smallest eigenvalue {:.3e})",
            min_eig
        )));
    }
    Ok(())
}
