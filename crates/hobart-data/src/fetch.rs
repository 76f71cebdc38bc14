//! Holdings dataset retrieval.

use crate::cache;
use crate::error::{DataError, Result};
use crate::schema;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

/// Default source for the holdings dataset.
pub const DEFAULT_DATASET_URL: &str =
    "https://data.factordynamics.com/hobart/holdings_sample.csv";

const USER_AGENT: &str = concat!("hobart/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for dataset fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whether to use the on-disk cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached bytes).
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { use_cache: true, force_refresh: false }
    }
}

/// Holdings dataset provider: one CSV per reporting period over HTTP, with
/// a byte-level file cache.
pub struct HoldingsProvider {
    client: reqwest::Client,
    url: String,
}

impl std::fmt::Debug for HoldingsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoldingsProvider")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl Default for HoldingsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldingsProvider {
    /// Create a provider for the default dataset location.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_DATASET_URL)
    }

    /// Create a provider for a custom dataset location.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            url: url.into(),
        }
    }

    /// Source URL this provider reads from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cache file name derived from the source URL.
    pub fn cache_name(&self) -> &str {
        self.url.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("holdings.csv")
    }

    /// Fetch the holdings table, reading from the cache when allowed and
    /// falling back to HTTP.
    ///
    /// # Errors
    /// Returns an error on HTTP failure, a non-success status, malformed
    /// CSV, or a schema violation.
    pub async fn fetch(&self, config: &FetchConfig) -> Result<DataFrame> {
        if config.use_cache && !config.force_refresh {
            let dir = cache::default_dir()?;
            if let Some(bytes) = cache::read(&dir, self.cache_name())? {
                return read_holdings_csv(&bytes);
            }
        }

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(DataError::Http(format!(
                "{} returned status {}",
                self.url,
                response.status()
            )));
        }
        let bytes = response.bytes().await?;

        if config.use_cache {
            // Cache writes are best-effort; a read-only cache directory
            // must not fail the fetch
            if let Ok(dir) = cache::default_dir() {
                cache::write(&dir, self.cache_name(), &bytes).ok();
            }
        }

        read_holdings_csv(&bytes)
    }
}

/// Parse holdings CSV bytes into a normalized `DataFrame`.
///
/// # Errors
/// Returns an error on malformed CSV or a schema violation.
pub fn read_holdings_csv(bytes: &[u8]) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    schema::normalize(df)
}

/// Load a holdings CSV from a local file.
///
/// # Errors
/// Returns an error when the file cannot be read or violates the schema.
pub fn load_file(path: &Path) -> Result<DataFrame> {
    let bytes = std::fs::read(path)?;
    read_holdings_csv(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_csv() -> String {
        let mut csv = String::from(
            "manager_id,permno,weight,ln_be,profitability,investment,dividends_to_book,market_beta,ln_me,ln_me_iv\n",
        );
        csv.push_str("7,10001,0.40,1.2,0.10,0.05,0.02,1.1,2.0,1.9\n");
        csv.push_str("7,10002,0.00,0.8,0.04,0.01,0.00,0.9,1.5,1.6\n");
        csv.push_str("9,10001,0.25,1.2,0.10,0.05,0.02,1.1,2.0,1.9\n");
        csv
    }

    #[test]
    fn test_read_holdings_csv() {
        let df = read_holdings_csv(sample_csv().as_bytes()).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 10);
        assert_eq!(
            df.column(schema::WEIGHT).unwrap().dtype(),
            &polars::prelude::DataType::Float64
        );
    }

    #[test]
    fn test_read_rejects_missing_columns() {
        let csv = "manager_id,weight\n7,0.4\n";
        assert!(matches!(
            read_holdings_csv(csv.as_bytes()),
            Err(DataError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join("hobart-fetch-test.csv");
        std::fs::write(&path, sample_csv()).unwrap();
        let df = load_file(&path).unwrap();
        assert_eq!(df.height(), 3);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_cache_name_from_url() {
        let provider = HoldingsProvider::with_url("https://example.com/data/holdings_1980q1.csv");
        assert_eq!(provider.cache_name(), "holdings_1980q1.csv");
        assert_eq!(HoldingsProvider::new().cache_name(), "holdings_sample.csv");
    }
}
