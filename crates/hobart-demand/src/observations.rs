//! Observation set for one (investor, period) pair.
//!
//! One row per security the investor could hold: the portfolio weight
//! (zero for securities not held), log market equity, its instrument, and a
//! fixed-width vector of stock characteristics. The remainder of the
//! portfolio is the outside asset and is never materialized as a row.

use crate::error::DemandError;
use ndarray::{Array1, Array2, s};

/// Slack allowed on the weights-sum-to-at-most-one invariant.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Holdings of a single investor in a single reporting period.
///
/// Construction validates the input contract once; the set is read-only
/// afterwards, so estimator calls stay pure functions of their arguments.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    weights: Array1<f64>,
    ln_market_equity: Array1<f64>,
    instrument: Array1<f64>,
    characteristics: Array2<f64>,
}

impl ObservationSet {
    /// Assemble and validate an observation set.
    ///
    /// # Arguments
    /// * `weights` - portfolio weights, one per security, zero for no position
    /// * `ln_market_equity` - log market equity (endogenous regressor)
    /// * `instrument` - instrument for log market equity
    /// * `characteristics` - one row per security, one column per characteristic
    ///
    /// # Errors
    /// Returns an error when row counts disagree, any value is non-finite,
    /// a weight is negative, the weights sum above one, there is no
    /// characteristic column, or no strictly positive weight exists.
    pub fn new(
        weights: Array1<f64>,
        ln_market_equity: Array1<f64>,
        instrument: Array1<f64>,
        characteristics: Array2<f64>,
    ) -> Result<Self, DemandError> {
        let n = weights.len();
        if ln_market_equity.len() != n {
            return Err(DemandError::DimensionMismatch { expected: n, actual: ln_market_equity.len() });
        }
        if instrument.len() != n {
            return Err(DemandError::DimensionMismatch { expected: n, actual: instrument.len() });
        }
        if characteristics.nrows() != n {
            return Err(DemandError::DimensionMismatch { expected: n, actual: characteristics.nrows() });
        }
        if characteristics.ncols() == 0 {
            return Err(DemandError::InvalidData(
                "at least one characteristic column is required".to_string(),
            ));
        }

        let all_finite = weights.iter()
            .chain(ln_market_equity.iter())
            .chain(instrument.iter())
            .chain(characteristics.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(DemandError::InvalidData(
                "non-finite value in observation set".to_string(),
            ));
        }

        if let Some(w) = weights.iter().find(|w| **w < 0.0) {
            return Err(DemandError::InvalidData(format!("negative portfolio weight {w}")));
        }

        let weight_sum: f64 = weights.sum();
        if weight_sum > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(DemandError::InvalidData(format!(
                "portfolio weights sum to {weight_sum}, above one"
            )));
        }

        let set = Self { weights, ln_market_equity, instrument, characteristics };
        if set.n_positive() == 0 {
            return Err(DemandError::InsufficientData { required: 1, actual: 0 });
        }
        Ok(set)
    }

    /// Number of securities in the set, held or not.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the set has no rows.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Width of the characteristic vector.
    pub fn characteristic_count(&self) -> usize {
        self.characteristics.ncols()
    }

    /// Number of strictly positive holdings.
    pub fn n_positive(&self) -> usize {
        self.weights.iter().filter(|w| **w > 0.0).count()
    }

    /// Portfolio weights.
    pub const fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Log market equity per security.
    pub const fn ln_market_equity(&self) -> &Array1<f64> {
        &self.ln_market_equity
    }

    /// Instrument for log market equity per security.
    pub const fn instrument(&self) -> &Array1<f64> {
        &self.instrument
    }

    /// Characteristic matrix (n x k).
    pub const fn characteristics(&self) -> &Array2<f64> {
        &self.characteristics
    }

    /// The subset of rows with strictly positive weight.
    ///
    /// The log-ratio transform of the linear estimator is undefined at a
    /// weight of zero, so it operates on this view; the nonlinear estimator
    /// keeps every row.
    pub fn positive_holdings(&self) -> Self {
        let keep: Vec<usize> = self
            .weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0.0)
            .map(|(i, _)| i)
            .collect();

        let k = self.characteristic_count();
        let mut characteristics = Array2::zeros((keep.len(), k));
        for (row, &i) in keep.iter().enumerate() {
            characteristics.row_mut(row).assign(&self.characteristics.row(i));
        }

        Self {
            weights: keep.iter().map(|&i| self.weights[i]).collect(),
            ln_market_equity: keep.iter().map(|&i| self.ln_market_equity[i]).collect(),
            instrument: keep.iter().map(|&i| self.instrument[i]).collect(),
            characteristics,
        }
    }

    /// Design matrix `[ln_me | characteristics | 1]`, shape (n, k+2).
    pub fn design_matrix(&self) -> Array2<f64> {
        self.with_leading_column(&self.ln_market_equity)
    }

    /// Instrument matrix `[ln_me_iv | characteristics | 1]`, shape (n, k+2).
    pub fn instrument_matrix(&self) -> Array2<f64> {
        self.with_leading_column(&self.instrument)
    }

    /// Reduced design `[characteristics | 1]`, shape (n, k+1), used when the
    /// market-equity coefficient is fixed at the ceiling.
    pub fn reduced_design_matrix(&self) -> Array2<f64> {
        let k = self.characteristic_count();
        let mut m = Array2::ones((self.len(), k + 1));
        m.slice_mut(s![.., ..k]).assign(&self.characteristics);
        m
    }

    fn with_leading_column(&self, first: &Array1<f64>) -> Array2<f64> {
        let k = self.characteristic_count();
        let mut m = Array2::ones((self.len(), k + 2));
        m.column_mut(0).assign(first);
        m.slice_mut(s![.., 1..=k]).assign(&self.characteristics);
        m
    }
}
