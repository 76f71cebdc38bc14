//! Iterative nonlinear IV estimator.
//!
//! Fits the exponential demand model on weight levels,
//!
//! w_i = exp(beta_me * ln_me_i + gamma' c_i + alpha) * eps_i
//!
//! through the moment condition E[eps_i | instruments] = 1, so zero-weight
//! holdings stay in the sample instead of being discarded by a log
//! transform. Each step linearizes the moment condition at the current
//! coefficients and solves the resulting system (a Gauss-Newton fixed
//! point):
//!
//! eps = w (.) exp(-X beta)
//! beta <- beta + (Z~'X)^-1 Z'(eps - 1),   Z~ = diag(eps) Z
//!
//! The fixed-point map is not guaranteed to contract, so the iteration
//! carries an explicit step budget and reports exhaustion as a distinct
//! error instead of looping forever or returning a half-converged vector.

use crate::coefficients::DemandCoefficients;
use crate::error::DemandError;
use crate::math::solve_linear_system;
use crate::observations::ObservationSet;
use crate::{DEFAULT_CEILING, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Configuration for the nonlinear IV estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NonlinearIvConfig {
    /// Upper bound on the market-equity coefficient; breaching it restarts
    /// the iteration with the coefficient fixed at this value.
    pub ceiling: f64,
    /// Convergence tolerance on the largest per-coefficient change.
    pub tolerance: f64,
    /// Step budget before the iteration is declared non-convergent.
    pub max_iterations: usize,
}

impl Default for NonlinearIvConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A completed nonlinear IV fit.
#[derive(Debug, Clone)]
pub struct NonlinearFit {
    /// Estimated coefficients, market-equity coefficient at most the ceiling.
    pub coefficients: DemandCoefficients,
    /// Iterations taken by the branch that produced the result (the
    /// constrained branch restarts its own count).
    pub iterations: usize,
    /// Whether the ceiling was binding and the constrained branch ran.
    pub constrained: bool,
    /// Number of rows in the design matrices: every holding, zero weights
    /// included.
    pub n_used: usize,
}

/// Gauss-Newton estimator for the exponential demand model.
#[derive(Debug, Default)]
pub struct NonlinearIvEstimator {
    config: NonlinearIvConfig,
}

impl NonlinearIvEstimator {
    /// Create an estimator with the given configuration.
    pub const fn new(config: NonlinearIvConfig) -> Self {
        Self { config }
    }

    /// Estimate demand coefficients for one investor and period.
    ///
    /// `start` seeds the iteration; by convention it is the linear IV fit
    /// for the same observation set. All rows participate, including
    /// zero-weight holdings.
    ///
    /// # Errors
    /// Returns [`DemandError::DidNotConverge`] when the step budget runs out,
    /// with the final iterate attached; singular linearized systems and
    /// under-identified data are fatal, as for the linear estimator.
    pub fn estimate(
        &self,
        observations: &ObservationSet,
        start: &DemandCoefficients,
    ) -> Result<NonlinearFit, DemandError> {
        let k = observations.characteristic_count();
        if start.characteristic_count() != k {
            return Err(DemandError::DimensionMismatch {
                expected: k,
                actual: start.characteristic_count(),
            });
        }
        // Zero-weight rows contribute nothing to Z~'X, so identification
        // still rests on the positive holdings.
        if observations.n_positive() < k + 2 {
            return Err(DemandError::InsufficientData {
                required: k + 2,
                actual: observations.n_positive(),
            });
        }

        let n = observations.len();
        let weights = observations.weights();
        let design = observations.design_matrix();
        let instruments = observations.instrument_matrix();
        let no_offset = Array1::zeros(n);

        let (beta, iterations) = self.iterate(
            weights,
            &design,
            &instruments,
            &no_offset,
            start.to_vector(),
        )?;

        if beta[0] <= self.config.ceiling {
            return Ok(NonlinearFit {
                coefficients: DemandCoefficients::from_vector(&beta)?,
                iterations,
                constrained: false,
                n_used: n,
            });
        }

        // Ceiling binds: fix the market-equity coefficient, fold it into the
        // offset, drop its column from the unknowns, and reseed the reduced
        // vector from the starting characteristics and intercept.
        let offset = observations.ln_market_equity() * self.config.ceiling;
        let reduced = observations.reduced_design_matrix();
        let mut seed = Vec::with_capacity(k + 1);
        seed.extend(start.characteristics.iter().copied());
        seed.push(start.intercept);

        match self.iterate(weights, &reduced, &reduced, &offset, Array1::from_vec(seed)) {
            Ok((gamma, iterations)) => {
                let mut stacked = Vec::with_capacity(k + 2);
                stacked.push(self.config.ceiling);
                stacked.extend(gamma.iter().copied());
                Ok(NonlinearFit {
                    coefficients: DemandCoefficients::from_vector(&stacked.into())?,
                    iterations,
                    constrained: true,
                    n_used: n,
                })
            }
            Err(DemandError::DidNotConverge { iterations, last_delta, last_coefficients }) => {
                // Restore full-length ordering in the reported iterate
                let mut full = Vec::with_capacity(k + 2);
                full.push(self.config.ceiling);
                full.extend(last_coefficients);
                Err(DemandError::DidNotConverge { iterations, last_delta, last_coefficients: full })
            }
            Err(e) => Err(e),
        }
    }

    /// One Gauss-Newton fixed point, parameterized over the design so the
    /// free and fixed-coefficient branches share it: the fixed branch passes
    /// the reduced design and moves `ceiling * ln_me` into `offset`.
    fn iterate(
        &self,
        weights: &Array1<f64>,
        design: &Array2<f64>,
        instruments: &Array2<f64>,
        offset: &Array1<f64>,
        mut beta: Array1<f64>,
    ) -> Result<(Array1<f64>, usize), DemandError> {
        let mut last_delta = f64::INFINITY;
        for iteration in 1..=self.config.max_iterations {
            let latent = latent_demand(weights, design, offset, &beta);
            let residual = latent.mapv(|e| e - 1.0);
            let scaled = scale_rows(instruments, &latent);

            let step = solve_linear_system(
                &scaled.t().dot(design),
                &instruments.t().dot(&residual),
            )?;
            beta += &step;

            last_delta = step.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
            if last_delta <= self.config.tolerance {
                return Ok((beta, iteration));
            }
        }

        Err(DemandError::DidNotConverge {
            iterations: self.config.max_iterations,
            last_delta,
            last_coefficients: beta.to_vec(),
        })
    }
}

/// Model-implied latent demand `w (.) exp(-(offset + X beta))`.
fn latent_demand(
    weights: &Array1<f64>,
    design: &Array2<f64>,
    offset: &Array1<f64>,
    beta: &Array1<f64>,
) -> Array1<f64> {
    let fitted = design.dot(beta) + offset;
    weights
        .iter()
        .zip(fitted.iter())
        .map(|(w, f)| w * (-f).exp())
        .collect()
}

/// Scale each row of `matrix` by the matching entry of `by`.
fn scale_rows(matrix: &Array2<f64>, by: &Array1<f64>) -> Array2<f64> {
    let mut scaled = matrix.clone();
    for (mut row, factor) in scaled.rows_mut().into_iter().zip(by.iter()) {
        row *= *factor;
    }
    scaled
}
