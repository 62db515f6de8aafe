//! Numerical building blocks: the bounded inventory grid and the adaptive
//! Runge-Kutta integrator used by the quoting engine.

pub mod grid;
pub mod ode;

pub use grid::InventoryGrid;
pub use ode::{DormandPrince45, OdeError, OdeSolution};
