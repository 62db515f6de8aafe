//! Optimal multi-asset market making controls.
//!
//! Given a set of correlated instruments quoted simultaneously, this crate
//! computes the optimal distance from each asset's mid-price at which to
//! post a bid and an ask, under inventory-risk aversion and execution-risk
//! aversion, with Poisson order arrivals whose intensity decays
//! exponentially with quote distance.
//!
//! The computation builds the bounded inventory grid, evaluates the
//! quadratic running cost of inventory under the covariance matrix,
//! integrates the coupled exponential-transform ODE field to the quoting
//! horizon with an adaptive Runge-Kutta method, and reads the per-asset
//! bid/ask distances off the final field in closed form.
//!
//! ```no_run
//! use multi_asset_quoting::{AssetSpec, ModelParameters, OptimalControlEngine};
//! use nalgebra::dmatrix;
//!
//! let assets = [AssetSpec {
//!     inventory_bound: 1,
//!     base_intensity: 1.0,
//!     intensity_decay: 2.0,
//! }];
//! let params = ModelParameters {
//!     price_risk_aversion: 0.1,
//!     exec_risk_aversion: 0.0,
//!     horizon: 3.0,
//!     covariance: dmatrix![1.0],
//! };
//! let sheet = OptimalControlEngine::new().compute(&assets, &params)?;
//! let bid_distance = sheet.quotes[0].bid.unwrap();
//! # Ok::<(), multi_asset_quoting::EngineError>(())
//! ```
//!
//! The engine is a pure, synchronous computation: no I/O, no shared state,
//! one snapshot per call. Covariance matrices, base intensities, and decay
//! rates come from external calibration; mid-prices are only needed by the
//! caller to turn distances into absolute quotes.

pub mod error;
pub mod math;
pub mod quoting;

pub use error::{EngineError, Result};
pub use math::InventoryGrid;
pub use quoting::{
    AssetSpec, ControlField, ModelParameters, OptimalControlEngine, QuoteControl, QuoteSheet,
    SolverDiagnostics, SolverSettings,
};
