//! Adaptive embedded Runge-Kutta integration.
//!
//! Dormand-Prince 5(4) with proportional step control. The transform field
//! has source terms of the form exp(k * dtheta) that can grow or decay
//! sharply, so the integrator carries both relative and absolute tolerances
//! and a hard step budget; exhausting the budget is an error, never a
//! silently truncated solution.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OdeError {
    #[error("step budget of {max_steps} exhausted at t = {t:.6} (step size {step:.3e})")]
    StepBudgetExhausted {
        t: f64,
        step: f64,
        steps: usize,
        max_steps: usize,
    },
    #[error("step size underflow at t = {t:.6} (step size {step:.3e})")]
    StepSizeUnderflow { t: f64, step: f64, steps: usize },
}

impl OdeError {
    /// Integration time reached before the failure.
    pub fn elapsed(&self) -> f64 {
        match *self {
            OdeError::StepBudgetExhausted { t, .. } => t,
            OdeError::StepSizeUnderflow { t, .. } => t,
        }
    }

    /// Step size in force when the integrator gave up.
    pub fn last_step(&self) -> f64 {
        match *self {
            OdeError::StepBudgetExhausted { step, .. } => step,
            OdeError::StepSizeUnderflow { step, .. } => step,
        }
    }

    /// Accepted steps before the failure.
    pub fn steps(&self) -> usize {
        match *self {
            OdeError::StepBudgetExhausted { steps, .. } => steps,
            OdeError::StepSizeUnderflow { steps, .. } => steps,
        }
    }
}

/// Final state and integration statistics.
#[derive(Debug, Clone)]
pub struct OdeSolution {
    /// State vector at the end of the integration span.
    pub y: Vec<f64>,
    pub steps_accepted: usize,
    pub steps_rejected: usize,
    pub rhs_evaluations: usize,
    /// Scaled error estimate of the last accepted step (<= 1 by construction).
    pub final_error: f64,
}

/// Dormand-Prince 5(4) integrator with adaptive step size.
#[derive(Debug, Clone, Copy)]
pub struct DormandPrince45 {
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub max_steps: usize,
}

// Step-size controller constants (Hairer-Norsett-Wanner II.4).
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

impl Default for DormandPrince45 {
    fn default() -> Self {
        Self {
            rel_tol: 1e-8,
            abs_tol: 1e-10,
            max_steps: 200_000,
        }
    }
}

impl DormandPrince45 {
    pub fn new(rel_tol: f64, abs_tol: f64, max_steps: usize) -> Self {
        Self {
            rel_tol,
            abs_tol,
            max_steps,
        }
    }

    /// Integrate `dy/dt = rhs(t, y)` from `t_span.0` to `t_span.1`.
    ///
    /// Only the final state is retained. `rhs` writes the derivative into
    /// its third argument, which is preallocated to the state dimension.
    pub fn integrate<F>(
        &self,
        mut rhs: F,
        t_span: (f64, f64),
        y0: Vec<f64>,
    ) -> Result<OdeSolution, OdeError>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        let (t0, t_end) = t_span;
        let span = t_end - t0;
        let n = y0.len();

        let mut t = t0;
        let mut y = y0;
        let mut h = span / 100.0;
        let min_step = 16.0 * f64::EPSILON * span.abs();

        let mut k = vec![vec![0.0f64; n]; 7];
        let mut y_stage = vec![0.0f64; n];
        let mut y_new = vec![0.0f64; n];

        let mut steps_accepted = 0usize;
        let mut steps_rejected = 0usize;
        let mut rhs_evaluations = 0usize;
        let mut final_error = 0.0f64;

        rhs(t, &y, &mut k[0]);
        rhs_evaluations += 1;

        while t < t_end {
            if steps_accepted + steps_rejected >= self.max_steps {
                return Err(OdeError::StepBudgetExhausted {
                    t,
                    step: h,
                    steps: steps_accepted,
                    max_steps: self.max_steps,
                });
            }
            if h < min_step {
                return Err(OdeError::StepSizeUnderflow {
                    t,
                    step: h,
                    steps: steps_accepted,
                });
            }
            if t + h > t_end {
                h = t_end - t;
            }

            // Stages 2..7; the A coefficients of the Dormand-Prince tableau.
            for (stage, (c, a_row)) in STAGES.iter().enumerate() {
                for i in 0..n {
                    let mut acc = 0.0;
                    for (j, &a) in a_row.iter().enumerate() {
                        acc += a * k[j][i];
                    }
                    y_stage[i] = y[i] + h * acc;
                }
                rhs(t + c * h, &y_stage, &mut k[stage + 1]);
                rhs_evaluations += 1;
            }

            // Fifth-order solution; the last stage was evaluated at it (FSAL).
            for i in 0..n {
                let mut acc = 0.0;
                for (j, &b) in B5.iter().enumerate() {
                    acc += b * k[j][i];
                }
                y_new[i] = y[i] + h * acc;
            }

            // Scaled RMS of the embedded 5th/4th-order difference.
            let mut err_sq = 0.0;
            let mut finite = true;
            for i in 0..n {
                if !y_new[i].is_finite() {
                    finite = false;
                    break;
                }
                let mut e = 0.0;
                for (j, &be) in E.iter().enumerate() {
                    e += be * k[j][i];
                }
                let scale = self.abs_tol + self.rel_tol * y[i].abs().max(y_new[i].abs());
                let r = h * e / scale;
                err_sq += r * r;
            }
            let err = if finite {
                (err_sq / n as f64).sqrt()
            } else {
                f64::INFINITY
            };

            if err <= 1.0 {
                t += h;
                if t_end - t < min_step {
                    t = t_end;
                }
                std::mem::swap(&mut y, &mut y_new);
                k.swap(0, 6);
                steps_accepted += 1;
                final_error = err;
                let factor = if err == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                h *= factor;
            } else {
                steps_rejected += 1;
                let factor = if err.is_finite() {
                    (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, 1.0)
                } else {
                    MIN_FACTOR
                };
                h *= factor;
                // k[0] still holds the derivative at (t, y); retry from it.
            }
        }

        Ok(OdeSolution {
            y,
            steps_accepted,
            steps_rejected,
            rhs_evaluations,
            final_error,
        })
    }
}

/// Stage abscissae and A-matrix rows for stages 2..=7.
const STAGES: [(f64, &[f64]); 6] = [
    (1.0 / 5.0, &[1.0 / 5.0]),
    (3.0 / 10.0, &[3.0 / 40.0, 9.0 / 40.0]),
    (4.0 / 5.0, &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0]),
    (
        8.0 / 9.0,
        &[
            19372.0 / 6561.0,
            -25360.0 / 2187.0,
            64448.0 / 6561.0,
            -212.0 / 729.0,
        ],
    ),
    (
        1.0,
        &[
            9017.0 / 3168.0,
            -355.0 / 33.0,
            46732.0 / 5247.0,
            49.0 / 176.0,
            -5103.0 / 18656.0,
        ],
    ),
    (
        1.0,
        &[
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
        ],
    ),
];

/// Fifth-order weights (identical to the final A row, giving FSAL).
const B5: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];

/// Difference between the 5th- and embedded 4th-order weights.
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];
