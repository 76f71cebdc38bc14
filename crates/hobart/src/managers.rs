//! Manager universe: the investors present in a holdings table.
//!
//! Unlike a stock universe, the set of managers is defined by the dataset
//! itself, so the universe is built from a loaded table rather than a
//! hardcoded constituent list.

use hobart_data::{DataError, select};
use polars::prelude::DataFrame;
use std::collections::HashMap;

/// One manager's footprint in the holdings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSummary {
    /// Investor identifier.
    pub manager_id: i64,
    /// Securities in the manager's observation set, held or not.
    pub n_holdings: usize,
    /// Strictly positive holdings.
    pub n_positive: usize,
}

/// The managers present in one holdings table.
#[derive(Debug, Clone)]
pub struct ManagerUniverse {
    managers: Vec<ManagerSummary>,
    by_id: HashMap<i64, usize>,
}

impl ManagerUniverse {
    /// Build the universe from a loaded holdings table.
    ///
    /// # Errors
    /// Returns an error when the table violates the holdings schema.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, DataError> {
        let counts = select::holding_counts(df)?;

        let ids = counts.column(hobart_data::schema::MANAGER_ID)?.i64()?;
        let n_holdings = counts.column("n_holdings")?.u32()?;
        let n_positive = counts.column("n_positive")?.u32()?;

        let managers: Vec<ManagerSummary> = ids
            .into_no_null_iter()
            .zip(n_holdings.into_no_null_iter())
            .zip(n_positive.into_no_null_iter())
            .map(|((manager_id, held), positive)| ManagerSummary {
                manager_id,
                n_holdings: held as usize,
                n_positive: positive as usize,
            })
            .collect();

        let by_id = managers
            .iter()
            .enumerate()
            .map(|(index, m)| (m.manager_id, index))
            .collect();

        Ok(Self { managers, by_id })
    }

    /// All managers, ascending by identifier.
    pub fn managers(&self) -> &[ManagerSummary] {
        &self.managers
    }

    /// All manager identifiers, ascending.
    pub fn ids(&self) -> Vec<i64> {
        self.managers.iter().map(|m| m.manager_id).collect()
    }

    /// Look up one manager.
    pub fn get(&self, manager_id: i64) -> Option<&ManagerSummary> {
        self.by_id.get(&manager_id).map(|&index| &self.managers[index])
    }

    /// Whether the identifier appears in the table.
    pub fn contains(&self, manager_id: i64) -> bool {
        self.by_id.contains_key(&manager_id)
    }

    /// Number of distinct managers.
    pub fn size(&self) -> usize {
        self.managers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_data::schema;
    use polars::prelude::*;

    fn sample_frame() -> DataFrame {
        let mut columns: Vec<Column> = vec![
            Series::new(schema::MANAGER_ID.into(), vec![7_i64, 7, 9]).into(),
            Series::new(schema::PERMNO.into(), vec![1_i64, 2, 1]).into(),
            Series::new(schema::WEIGHT.into(), vec![0.4, 0.0, 0.5]).into(),
        ];
        for name in schema::CHARACTERISTICS {
            columns.push(Series::new(name.into(), vec![0.1, 0.2, 0.3]).into());
        }
        columns.push(Series::new(schema::LN_ME.into(), vec![1.0, 2.0, 1.5]).into());
        columns.push(Series::new(schema::LN_ME_IV.into(), vec![1.1, 1.9, 1.4]).into());
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn test_universe_from_dataframe() {
        let universe = ManagerUniverse::from_dataframe(&sample_frame()).unwrap();
        assert_eq!(universe.size(), 2);
        assert_eq!(universe.ids(), vec![7, 9]);

        let seven = universe.get(7).unwrap();
        assert_eq!(seven.n_holdings, 2);
        assert_eq!(seven.n_positive, 1);

        assert!(universe.contains(9));
        assert!(!universe.contains(42));
    }
}
