use thiserror::Error;

/// Errors surfaced by the quoting engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Invalid asset specification or model parameters. Raised before any
    /// grid construction or integration work is done.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The ODE integrator could not reach the quoting horizon within its
    /// step and tolerance budget. The partial transform field is discarded.
    #[error(
        "integration failed at t = {elapsed:.6} after {steps} steps (last step size {last_step:.3e})"
    )]
    Numerical {
        /// Integration time reached before the failure.
        elapsed: f64,
        /// Step size in force when the integrator gave up.
        last_step: f64,
        /// Accepted steps taken before the failure.
        steps: usize,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
