//! Byte-level file cache for downloaded datasets.
//!
//! The holdings dataset is one file per period, so caching is a plain
//! write-through of the downloaded bytes under the platform cache
//! directory.

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default cache directory, `<platform cache dir>/hobart`.
///
/// # Errors
/// Returns an error when the platform exposes no cache directory.
pub fn default_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|base| base.join("hobart"))
        .ok_or_else(|| DataError::Cache("no platform cache directory".to_string()))
}

/// Read a cached dataset, `None` when absent.
///
/// # Errors
/// Returns an error when the file exists but cannot be read.
pub fn read(dir: &Path, name: &str) -> Result<Option<Vec<u8>>> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read(path)?))
}

/// Write a dataset into the cache, creating the directory if needed.
///
/// # Errors
/// Returns an error when the directory or file cannot be written.
pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Remove one cached dataset if present.
///
/// # Errors
/// Returns an error when the file exists but cannot be removed.
pub fn remove(dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Status of one cached dataset, for CLI display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Full path of the cached file.
    pub path: PathBuf,
    /// Whether the file is present.
    pub exists: bool,
    /// File size in bytes, zero when absent.
    pub size_bytes: u64,
    /// Last modification time, when available.
    pub modified: Option<DateTime<Utc>>,
}

/// Inspect the cache entry for a dataset.
pub fn info(dir: &Path, name: &str) -> CacheInfo {
    let path = dir.join(name);
    match fs::metadata(&path) {
        Ok(meta) => CacheInfo {
            exists: true,
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            path,
        },
        Err(_) => CacheInfo { path, exists: false, size_bytes: 0, modified: None },
    }
}
