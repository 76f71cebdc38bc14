//! End-to-end estimation tests: linear IV seeding nonlinear IV on synthetic
//! holdings, the convention the pipeline uses for every investor.

use approx::assert_relative_eq;
use hobart_demand::{
    LinearIvEstimator, NonlinearIvConfig, NonlinearIvEstimator, ObservationSet,
};
use ndarray::{Array1, Array2};

/// Holdings generated exactly from the demand model, with a configurable
/// number of zero-weight rows appended.
fn synthetic_holdings(
    beta_me: f64,
    gamma: &[f64],
    intercept: f64,
    n_held: usize,
    n_zero: usize,
) -> ObservationSet {
    let k = gamma.len();
    let n = n_held + n_zero;

    let ln_me: Array1<f64> =
        (0..n).map(|i| 0.5 + 0.05 * i as f64 + 0.3 * ((i + 1) as f64 * 2.3).sin()).collect();
    let instrument: Array1<f64> =
        ln_me.iter().enumerate().map(|(i, v)| 0.8 * v + 0.2 * ((i + 3) as f64 * 1.9).cos()).collect();
    let mut characteristics = Array2::zeros((n, k));
    for i in 0..n {
        for j in 0..k {
            characteristics[[i, j]] = ((i + 1) as f64 * (0.9 + 0.4 * j as f64)).sin();
        }
    }

    let weights: Array1<f64> = (0..n)
        .map(|i| {
            if i >= n_held {
                return 0.0;
            }
            let mut exponent = beta_me * ln_me[i] + intercept;
            for j in 0..k {
                exponent += gamma[j] * characteristics[[i, j]];
            }
            exponent.exp()
        })
        .collect();

    ObservationSet::new(weights, ln_me, instrument, characteristics).unwrap()
}

#[test]
fn linear_fit_seeds_nonlinear_fit() {
    let gamma = [0.35, -0.25, 0.2, 0.05, -0.15];
    let holdings = synthetic_holdings(-1.2, &gamma, -5.5, 18, 0);

    let linear = LinearIvEstimator::default().estimate(&holdings).unwrap();
    assert!(!linear.constrained);
    assert_relative_eq!(linear.coefficients.market_equity, -1.2, epsilon = 1e-7);

    let nonlinear = NonlinearIvEstimator::default()
        .estimate(&holdings, &linear.coefficients)
        .unwrap();
    assert!(nonlinear.iterations < 50);
    assert_relative_eq!(nonlinear.coefficients.market_equity, -1.2, epsilon = 1e-6);
    for (estimated, expected) in
        nonlinear.coefficients.characteristics.iter().zip(gamma.iter())
    {
        assert_relative_eq!(*estimated, *expected, epsilon = 1e-6);
    }
    assert_relative_eq!(nonlinear.coefficients.intercept, -5.5, epsilon = 1e-6);
}

#[test]
fn zero_rows_separate_the_two_estimators() {
    let gamma = [0.35, -0.25, 0.2, 0.05, -0.15];
    let held_only = synthetic_holdings(-1.2, &gamma, -5.5, 18, 0);
    let with_zeros = synthetic_holdings(-1.2, &gamma, -5.5, 18, 3);

    let estimator = LinearIvEstimator::default();
    let a = estimator.estimate(&held_only).unwrap();
    let b = estimator.estimate(&with_zeros).unwrap();

    // Linear IV filters zero-weight rows, so both fits are identical
    assert_eq!(a.n_used, b.n_used);
    for (x, y) in
        a.coefficients.to_vector().iter().zip(b.coefficients.to_vector().iter())
    {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }

    // Nonlinear IV keeps them, and the unheld securities move the fit
    let nonlinear = NonlinearIvEstimator::default();
    let na = nonlinear.estimate(&held_only, &a.coefficients).unwrap();
    let nb = nonlinear.estimate(&with_zeros, &b.coefficients).unwrap();
    assert_eq!(na.n_used, 18);
    assert_eq!(nb.n_used, 21);
    let shift = na
        .coefficients
        .to_vector()
        .iter()
        .zip(nb.coefficients.to_vector().iter())
        .fold(0.0_f64, |acc, (x, y)| acc.max((x - y).abs()));
    assert!(shift > 1e-4, "zero rows left the nonlinear fit unchanged (shift {shift})");
}

#[test]
fn both_estimators_respect_the_ceiling() {
    let gamma = [0.35, -0.25, 0.2, 0.05, -0.15];
    let holdings = synthetic_holdings(1.2, &gamma, -6.5, 18, 2);

    let linear = LinearIvEstimator::default().estimate(&holdings).unwrap();
    assert!(linear.constrained);
    assert_relative_eq!(linear.coefficients.market_equity, 0.99, epsilon = 1e-12);

    let nonlinear = NonlinearIvEstimator::new(NonlinearIvConfig::default())
        .estimate(&holdings, &linear.coefficients)
        .unwrap();
    assert!(nonlinear.coefficients.market_equity <= 0.99 + 1e-12);
}
