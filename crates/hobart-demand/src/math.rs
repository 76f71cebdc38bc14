//! Dense linear algebra for the estimators.
//!
//! Both estimators reduce to repeated solves of small (k+2)-dimensional
//! systems built from instrument/design cross-products, so a direct
//! Gaussian-elimination solve is all that is needed here.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Pivots smaller than this are treated as a singular system.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Errors from the dense solvers.
#[derive(Debug, Error)]
pub enum MathError {
    /// Empty input
    #[error("Empty input: nothing to solve")]
    EmptyData,

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Singular or near-singular system
    #[error("Singular system: {0}")]
    Singular(String),
}

/// Solve the square system `A x = b` by Gaussian elimination with partial
/// pivoting.
///
/// # Errors
/// Returns an error if `A` is not square, dimensions disagree, or a pivot
/// falls below the singularity tolerance.
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }

    // Work on an augmented copy [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        // Partial pivot: largest magnitude entry on or below the diagonal
        let mut pivot_row = col;
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > aug[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }

        if aug[[pivot_row, col]].abs() < PIVOT_TOLERANCE {
            return Err(MathError::Singular(format!(
                "pivot {:.3e} below tolerance in column {}",
                aug[[pivot_row, col]].abs(),
                col
            )));
        }

        if pivot_row != col {
            for j in col..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut acc = aug[[i, n]];
        for j in (i + 1)..n {
            acc -= aug[[i, j]] * x[j];
        }
        x[i] = acc / aug[[i, i]];
    }

    Ok(x)
}

/// Solve the just-identified instrumental-variables normal equation
/// `beta = (Z'X)^-1 Z'y`.
///
/// With `Z = X` this reduces to ordinary least squares, which is how the
/// constrained branches of both estimators reuse it.
///
/// # Errors
/// Returns an error if shapes disagree or `Z'X` is singular.
pub fn two_stage_coefficients(
    z: &Array2<f64>,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<Array1<f64>, MathError> {
    let n = x.nrows();
    if z.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: z.nrows() });
    }
    if y.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: y.len() });
    }
    if z.ncols() != x.ncols() {
        return Err(MathError::DimensionMismatch { expected: x.ncols(), actual: z.ncols() });
    }

    let ztx = z.t().dot(x);
    let zty = z.t().dot(y);
    solve_linear_system(&ztx, &zty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn solve_identity() {
        let a = Array2::eye(3);
        let b = array![1.0, -2.0, 3.0];
        let x = solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], -2.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_requires_pivoting() {
        // Zero on the leading diagonal forces a row swap
        let a = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        let b = array![5.0, 7.0];
        let x = solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 7.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_singular_is_an_error() {
        let a = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        let b = array![1.0, 2.0];
        assert!(matches!(
            solve_linear_system(&a, &b),
            Err(MathError::Singular(_))
        ));
    }

    #[test]
    fn solve_rejects_bad_shapes() {
        let a = Array2::<f64>::zeros((2, 3));
        let b = array![1.0, 2.0];
        assert!(matches!(
            solve_linear_system(&a, &b),
            Err(MathError::DimensionMismatch { .. })
        ));

        let empty = Array2::<f64>::zeros((0, 0));
        let no_rhs = Array1::<f64>::zeros(0);
        assert!(matches!(
            solve_linear_system(&empty, &no_rhs),
            Err(MathError::EmptyData)
        ));
    }

    #[test]
    fn two_stage_reduces_to_ols_when_z_equals_x() {
        // y = 2 + 3 t, exactly
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0],
        )
        .unwrap();
        let y = array![2.0, 5.0, 8.0, 11.0];
        let beta = two_stage_coefficients(&x, &x, &y).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(beta[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn two_stage_with_distinct_instrument() {
        // Noise-free model: y = X beta, instrument correlated with the regressor
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0],
        )
        .unwrap();
        let z = Array2::from_shape_vec(
            (4, 2),
            vec![1.0, 0.9, 1.0, 2.2, 1.0, 2.8, 1.0, 4.1],
        )
        .unwrap();
        let beta_true = array![0.5, -1.25];
        let y = x.dot(&beta_true);
        let beta = two_stage_coefficients(&z, &x, &y).unwrap();
        assert_relative_eq!(beta[0], 0.5, epsilon = 1e-10);
        assert_relative_eq!(beta[1], -1.25, epsilon = 1e-10);
    }
}
