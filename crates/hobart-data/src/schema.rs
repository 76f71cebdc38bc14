//! Column schema of the holdings table.
//!
//! One row per (manager, security) pair in a single reporting period, in a
//! fixed column order: identifier, security id, weight, five stock
//! characteristics, log market equity, and its instrument.

use crate::error::{DataError, Result};
use polars::prelude::*;

/// Investor identifier column.
pub const MANAGER_ID: &str = "manager_id";

/// Security identifier column. Carried through selection, unused by the
/// estimators.
pub const PERMNO: &str = "permno";

/// Portfolio weight column.
pub const WEIGHT: &str = "weight";

/// Characteristic columns, in model order.
pub const CHARACTERISTICS: [&str; 5] = [
    "ln_be",
    "profitability",
    "investment",
    "dividends_to_book",
    "market_beta",
];

/// Log market equity column (endogenous regressor).
pub const LN_ME: &str = "ln_me";

/// Instrument column for log market equity.
pub const LN_ME_IV: &str = "ln_me_iv";

/// All columns in file order.
pub fn all_columns() -> Vec<&'static str> {
    let mut columns = vec![MANAGER_ID, PERMNO, WEIGHT];
    columns.extend(CHARACTERISTICS);
    columns.push(LN_ME);
    columns.push(LN_ME_IV);
    columns
}

/// Columns the estimators consume as floating point.
pub fn numeric_columns() -> Vec<&'static str> {
    let mut columns = vec![WEIGHT];
    columns.extend(CHARACTERISTICS);
    columns.push(LN_ME);
    columns.push(LN_ME_IV);
    columns
}

/// Check that every schema column is present.
///
/// # Errors
/// Returns [`DataError::MissingColumn`] naming the first absent column.
pub fn validate(df: &DataFrame) -> Result<()> {
    for name in all_columns() {
        if df.column(name).is_err() {
            return Err(DataError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

/// Validate and coerce a raw holdings table into the canonical layout:
/// identifier columns as `i64`, numeric columns as `f64`, schema column
/// order.
///
/// # Errors
/// Returns an error when a column is missing or a cast fails.
pub fn normalize(df: DataFrame) -> Result<DataFrame> {
    validate(&df)?;

    let mut casts: Vec<Expr> = vec![
        col(MANAGER_ID).cast(DataType::Int64),
        col(PERMNO).cast(DataType::Int64),
    ];
    casts.extend(
        numeric_columns()
            .into_iter()
            .map(|name| col(name).cast(DataType::Float64)),
    );

    let selection: Vec<Expr> = all_columns().into_iter().map(col).collect();
    let normalized = df.lazy().with_columns(casts).select(&selection).collect()?;
    Ok(normalized)
}
