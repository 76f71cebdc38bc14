//! Closed-form linear IV estimator.
//!
//! Works on the log-ratio transform of the positive portfolio weights:
//! with the outside-asset weight treated as a fixed denominator of one,
//!
//! ln w_i = beta_me * ln_me_i + gamma' c_i + alpha + e_i
//!
//! and the two-stage least-squares normal equation beta = (Z'X)^-1 Z'y
//! identifies the coefficients despite ln_me being endogenous. The fixed
//! outside-asset denominator is a property of the reference estimator; its
//! normalization is absorbed by the intercept.

use crate::DEFAULT_CEILING;
use crate::coefficients::DemandCoefficients;
use crate::error::DemandError;
use crate::math::two_stage_coefficients;
use crate::observations::ObservationSet;
use serde::{Deserialize, Serialize};

/// Configuration for the linear IV estimator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinearIvConfig {
    /// Upper bound on the market-equity coefficient. Estimates above it are
    /// re-solved with the coefficient fixed at this value.
    pub ceiling: f64,
}

impl Default for LinearIvConfig {
    fn default() -> Self {
        Self { ceiling: DEFAULT_CEILING }
    }
}

/// A completed linear IV fit.
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Estimated coefficients, market-equity coefficient at most the ceiling.
    pub coefficients: DemandCoefficients,
    /// Whether the ceiling was binding and the constrained re-solve ran.
    pub constrained: bool,
    /// Number of positive-weight holdings the fit used.
    pub n_used: usize,
}

/// Closed-form two-stage least-squares estimator on log weights.
#[derive(Debug, Default)]
pub struct LinearIvEstimator {
    config: LinearIvConfig,
}

impl LinearIvEstimator {
    /// Create an estimator with the given configuration.
    pub const fn new(config: LinearIvConfig) -> Self {
        Self { config }
    }

    /// Estimate demand coefficients for one investor and period.
    ///
    /// Zero-weight rows carry no information for the log transform and are
    /// dropped before the solve.
    ///
    /// # Errors
    /// Returns an error when fewer than `k + 2` positive-weight holdings
    /// remain or a cross-product matrix is singular. Both indicate data that
    /// cannot support estimation; neither is retried.
    pub fn estimate(&self, observations: &ObservationSet) -> Result<LinearFit, DemandError> {
        let positive = observations.positive_holdings();
        let k = positive.characteristic_count();
        let n = positive.len();
        if n < k + 2 {
            return Err(DemandError::InsufficientData { required: k + 2, actual: n });
        }

        let y = positive.weights().mapv(f64::ln);
        let x = positive.design_matrix();
        let z = positive.instrument_matrix();

        let beta = two_stage_coefficients(&z, &x, &y)?;
        if beta[0] <= self.config.ceiling {
            return Ok(LinearFit {
                coefficients: DemandCoefficients::from_vector(&beta)?,
                constrained: false,
                n_used: n,
            });
        }

        // Ceiling binds: fix the market-equity coefficient, move its
        // contribution into the dependent variable, and re-solve the reduced
        // system by OLS (the remaining regressors are exogenous).
        let y_adjusted = &y - &(positive.ln_market_equity() * self.config.ceiling);
        let reduced = positive.reduced_design_matrix();
        let gamma = two_stage_coefficients(&reduced, &reduced, &y_adjusted)?;

        let mut stacked = Vec::with_capacity(k + 2);
        stacked.push(self.config.ceiling);
        stacked.extend(gamma.iter().copied());
        Ok(LinearFit {
            coefficients: DemandCoefficients::from_vector(&stacked.into())?,
            constrained: true,
            n_used: n,
        })
    }
}
