//! Error types for demand estimation.

use crate::math::MathError;
use thiserror::Error;

/// Errors that can occur during demand estimation.
#[derive(Debug, Error)]
pub enum DemandError {
    /// Not enough usable observations to identify the coefficients
    #[error("Insufficient data: need at least {required} positive-weight holdings, got {actual}")]
    InsufficientData {
        /// Required number of positive-weight holdings
        required: usize,
        /// Actual number of positive-weight holdings
        actual: usize,
    },

    /// Dimension mismatch between inputs
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid observation data
    #[error("Invalid observation data: {0}")]
    InvalidData(String),

    /// Linear algebra failure (singular cross-product, degenerate design)
    #[error("Linear algebra error: {0}")]
    Math(#[from] MathError),

    /// The nonlinear iteration exhausted its step budget before reaching
    /// the convergence tolerance
    #[error(
        "Nonlinear IV did not converge within {iterations} iterations (last step {last_delta:.3e})"
    )]
    DidNotConverge {
        /// Number of iterations performed
        iterations: usize,
        /// Largest per-coefficient change at the final step
        last_delta: f64,
        /// Coefficient vector at the final step, in
        /// [market equity, characteristics.., intercept] order
        last_coefficients: Vec<f64>,
    },
}
