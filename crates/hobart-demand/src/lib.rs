#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod coefficients;
pub mod error;
pub mod linear;
pub mod math;
pub mod nonlinear;
pub mod observations;

pub use coefficients::DemandCoefficients;
pub use error::DemandError;
pub use linear::{LinearFit, LinearIvConfig, LinearIvEstimator};
pub use math::MathError;
pub use nonlinear::{NonlinearFit, NonlinearIvConfig, NonlinearIvEstimator};
pub use observations::ObservationSet;

/// Default ceiling on the market-equity coefficient. Estimates above it are
/// re-solved under the constraint so the implied demand system keeps a
/// unique equilibrium.
pub const DEFAULT_CEILING: f64 = 0.99;

/// Default convergence tolerance for the nonlinear iteration, measured as
/// the largest per-coefficient change in a step.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Default step budget for the nonlinear iteration.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
