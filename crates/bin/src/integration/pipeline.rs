//! DataFrame-to-estimator glue.

use chrono::Utc;
use hobart_data::schema;
use hobart_demand::{DemandError, LinearFit, NonlinearFit, ObservationSet};
use hobart_output::{CoefficientEstimate, DemandSummary};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Polars DataFrame error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    /// Estimation input error.
    #[error("Estimation error: {0}")]
    Demand(#[from] DemandError),
    /// Null cell in a column the estimators need.
    #[error("Null value in column {0}")]
    NullValue(String),
}

/// Extract one column as a dense `f64` vector, rejecting nulls.
fn column_f64(df: &DataFrame, name: &str) -> Result<Array1<f64>, PipelineError> {
    let values = df.column(name)?.f64()?;
    if values.null_count() > 0 {
        return Err(PipelineError::NullValue(name.to_string()));
    }
    Ok(values.into_no_null_iter().collect())
}

/// Build the estimators' observation set from one manager's holdings rows.
pub(crate) fn to_observation_set(holdings: &DataFrame) -> Result<ObservationSet, PipelineError> {
    let weights = column_f64(holdings, schema::WEIGHT)?;
    let ln_market_equity = column_f64(holdings, schema::LN_ME)?;
    let instrument = column_f64(holdings, schema::LN_ME_IV)?;

    let n = holdings.height();
    let k = schema::CHARACTERISTICS.len();
    let mut characteristics = Array2::zeros((n, k));
    for (j, name) in schema::CHARACTERISTICS.iter().enumerate() {
        let values = column_f64(holdings, name)?;
        characteristics.column_mut(j).assign(&values);
    }

    Ok(ObservationSet::new(
        weights,
        ln_market_equity,
        instrument,
        characteristics,
    )?)
}

/// Coefficient names in model order.
fn coefficient_names() -> Vec<String> {
    let mut names = vec![schema::LN_ME.to_string()];
    names.extend(schema::CHARACTERISTICS.iter().map(|s| (*s).to_string()));
    names.push("intercept".to_string());
    names
}

/// Combine both fits into a display summary.
pub(crate) fn summarize(
    manager_id: i64,
    observations: &ObservationSet,
    linear: &LinearFit,
    nonlinear: &NonlinearFit,
) -> DemandSummary {
    let linear_beta = linear.coefficients.to_vector();
    let nonlinear_beta = nonlinear.coefficients.to_vector();
    let coefficients = coefficient_names()
        .into_iter()
        .zip(linear_beta.iter().zip(nonlinear_beta.iter()))
        .map(|(name, (l, nl))| CoefficientEstimate::new(name, *l, *nl))
        .collect();

    DemandSummary::new(
        manager_id,
        Utc::now().date_naive(),
        observations.len(),
        observations.n_positive(),
        nonlinear.iterations,
        linear.constrained,
        nonlinear.constrained,
        coefficients,
    )
}
