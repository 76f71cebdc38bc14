//! Tabular selection: one investor's rows out of the holdings table.

use crate::error::{DataError, Result};
use crate::schema;
use polars::prelude::*;

/// Distinct manager identifiers in the table, ascending.
///
/// # Errors
/// Returns an error when the identifier column is missing or mistyped.
pub fn manager_ids(df: &DataFrame) -> Result<Vec<i64>> {
    let ids = df
        .column(schema::MANAGER_ID)
        .map_err(|_| DataError::MissingColumn(schema::MANAGER_ID.to_string()))?
        .i64()?
        .unique()?;
    let mut ids: Vec<i64> = ids.into_no_null_iter().collect();
    ids.sort_unstable();
    Ok(ids)
}

/// All rows belonging to one manager, other columns untouched.
///
/// # Errors
/// Returns [`DataError::ManagerNotFound`] when the table has no rows for
/// the identifier.
pub fn manager_holdings(df: &DataFrame, manager_id: i64) -> Result<DataFrame> {
    let selected = df
        .clone()
        .lazy()
        .filter(col(schema::MANAGER_ID).eq(lit(manager_id)))
        .collect()?;
    if selected.height() == 0 {
        return Err(DataError::ManagerNotFound(manager_id));
    }
    Ok(selected)
}

/// Per-manager holding counts: `manager_id`, `n_holdings`, `n_positive`,
/// sorted by identifier.
///
/// # Errors
/// Returns an error when the schema columns are missing.
pub fn holding_counts(df: &DataFrame) -> Result<DataFrame> {
    let counts = df
        .clone()
        .lazy()
        .group_by([col(schema::MANAGER_ID)])
        .agg([
            col(schema::WEIGHT).count().alias("n_holdings"),
            col(schema::WEIGHT).gt(lit(0.0)).sum().alias("n_positive"),
        ])
        .sort([schema::MANAGER_ID], Default::default())
        .collect()?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        let mut columns: Vec<Column> = vec![
            Series::new(schema::MANAGER_ID.into(), vec![7_i64, 7, 7, 9, 9]).into(),
            Series::new(schema::PERMNO.into(), vec![1_i64, 2, 3, 1, 2]).into(),
            Series::new(schema::WEIGHT.into(), vec![0.4, 0.0, 0.3, 0.5, 0.2]).into(),
        ];
        for name in schema::CHARACTERISTICS {
            columns.push(Series::new(name.into(), vec![0.1, 0.2, 0.3, 0.4, 0.5]).into());
        }
        columns.push(Series::new(schema::LN_ME.into(), vec![1.0, 2.0, 3.0, 1.5, 2.5]).into());
        columns.push(Series::new(schema::LN_ME_IV.into(), vec![1.1, 1.9, 3.1, 1.4, 2.6]).into());
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn test_manager_ids_sorted_unique() {
        let ids = manager_ids(&sample_frame()).unwrap();
        assert_eq!(ids, vec![7, 9]);
    }

    #[test]
    fn test_manager_holdings_filters_rows() {
        let holdings = manager_holdings(&sample_frame(), 7).unwrap();
        assert_eq!(holdings.height(), 3);
        let ids = holdings.column(schema::MANAGER_ID).unwrap().i64().unwrap();
        assert!(ids.into_no_null_iter().all(|id| id == 7));
    }

    #[test]
    fn test_unknown_manager_is_an_error() {
        assert!(matches!(
            manager_holdings(&sample_frame(), 42),
            Err(DataError::ManagerNotFound(42))
        ));
    }

    #[test]
    fn test_holding_counts() {
        let counts = holding_counts(&sample_frame()).unwrap();
        assert_eq!(counts.height(), 2);
        let n_holdings = counts.column("n_holdings").unwrap().u32().unwrap();
        let n_positive = counts.column("n_positive").unwrap().u32().unwrap();
        // Manager 7 holds two of three securities, manager 9 both of two
        assert_eq!(n_holdings.get(0), Some(3));
        assert_eq!(n_positive.get(0), Some(2));
        assert_eq!(n_holdings.get(1), Some(2));
        assert_eq!(n_positive.get(1), Some(2));
    }
}
