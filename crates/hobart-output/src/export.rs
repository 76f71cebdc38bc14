//! CSV and JSON export for demand summaries.

use crate::summary::DemandSummary;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One coefficient flattened for CSV export.
#[derive(Debug, Serialize, Deserialize)]
struct CoefficientFlat {
    manager_id: i64,
    coefficient: String,
    linear: f64,
    nonlinear: f64,
}

fn flat_records(summary: &DemandSummary) -> Vec<CoefficientFlat> {
    summary
        .coefficients
        .iter()
        .map(|row| CoefficientFlat {
            manager_id: summary.manager_id,
            coefficient: row.name.clone(),
            linear: row.linear,
            nonlinear: row.nonlinear,
        })
        .collect()
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for DemandSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for record in flat_records(self) {
                    wtr.serialize(&record)?;
                }
                let data =
                    String::from_utf8(wtr.into_inner().map_err(|e| e.into_error())?).unwrap();
                Ok(data)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<DemandSummary> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for summary in self {
                    for record in flat_records(summary) {
                        wtr.serialize(&record)?;
                    }
                }
                let data =
                    String::from_utf8(wtr.into_inner().map_err(|e| e.into_error())?).unwrap();
                Ok(data)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::CoefficientEstimate;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn sample_summary() -> DemandSummary {
        DemandSummary::new(
            90,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            10,
            8,
            3,
            false,
            false,
            vec![
                CoefficientEstimate::new("ln_me".to_string(), -1.02, -0.98),
                CoefficientEstimate::new("intercept".to_string(), -5.1, -5.0),
            ],
        )
    }

    #[rstest]
    #[case(ExportFormat::Csv, "csv")]
    #[case(ExportFormat::Json, "json")]
    #[case(ExportFormat::PrettyJson, "json")]
    fn test_extension(#[case] format: ExportFormat, #[case] expected: &str) {
        assert_eq!(format.extension(), expected);
    }

    #[test]
    fn test_csv_export() {
        let csv = sample_summary().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("manager_id,coefficient,linear,nonlinear"));
        assert!(csv.contains("90,ln_me,-1.02,-0.98"));
    }

    #[test]
    fn test_json_round_trip() {
        let summary = sample_summary();
        let json = summary.export_to_string(ExportFormat::Json).unwrap();
        let back: DemandSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_vec_export_concatenates() {
        let summaries = vec![sample_summary(), sample_summary()];
        let csv = summaries.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv.matches("ln_me").count(), 2);
    }
}
