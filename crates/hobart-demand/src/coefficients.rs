//! Estimated demand coefficients.

use crate::error::DemandError;
use ndarray::Array1;

/// Coefficients of the demand curve for one investor and period.
///
/// Vector order is fixed across the crate:
/// `[market equity, characteristics.., intercept]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandCoefficients {
    /// Coefficient on log market equity. Capped at the stability ceiling by
    /// both estimators.
    pub market_equity: f64,
    /// One coefficient per stock characteristic, in column order.
    pub characteristics: Array1<f64>,
    /// Intercept coefficient.
    pub intercept: f64,
}

impl DemandCoefficients {
    /// Split a stacked coefficient vector into its named parts.
    ///
    /// # Errors
    /// Returns an error if the vector is shorter than the market-equity
    /// coefficient plus intercept.
    pub fn from_vector(beta: &Array1<f64>) -> Result<Self, DemandError> {
        if beta.len() < 2 {
            return Err(DemandError::DimensionMismatch { expected: 2, actual: beta.len() });
        }
        let k = beta.len() - 2;
        Ok(Self {
            market_equity: beta[0],
            characteristics: beta.iter().skip(1).take(k).copied().collect(),
            intercept: beta[beta.len() - 1],
        })
    }

    /// Stack the parts back into `[market equity, characteristics.., intercept]`.
    pub fn to_vector(&self) -> Array1<f64> {
        let mut out = Vec::with_capacity(self.len());
        out.push(self.market_equity);
        out.extend(self.characteristics.iter().copied());
        out.push(self.intercept);
        Array1::from_vec(out)
    }

    /// Total coefficient count, `k + 2`.
    pub fn len(&self) -> usize {
        self.characteristics.len() + 2
    }

    /// Whether the vector is empty. Never true for a constructed value.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of characteristic coefficients.
    pub fn characteristic_count(&self) -> usize {
        self.characteristics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn vector_round_trip() {
        let beta = array![-0.8, 0.1, 0.2, 0.3, -4.0];
        let coefficients = DemandCoefficients::from_vector(&beta).unwrap();
        assert_relative_eq!(coefficients.market_equity, -0.8, epsilon = 1e-12);
        assert_eq!(coefficients.characteristic_count(), 3);
        assert_relative_eq!(coefficients.intercept, -4.0, epsilon = 1e-12);

        let back = coefficients.to_vector();
        assert_eq!(back.len(), 5);
        for (a, b) in beta.iter().zip(back.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_short_vectors() {
        let beta = array![1.0];
        assert!(matches!(
            DemandCoefficients::from_vector(&beta),
            Err(DemandError::DimensionMismatch { .. })
        ));
    }
}
