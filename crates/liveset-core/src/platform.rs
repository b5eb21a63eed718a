//! Platform-specific path utilities.

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use std::path::PathBuf;

/// Get the per-user application data directory for the catalog.
///
/// # Platform Behavior
/// - **Linux**: `~/.local/share/AbletonProjectManager` (XDG_DATA_HOME)
/// - **Windows**: `%APPDATA%\AbletonProjectManager`
/// - **macOS**: `~/Library/Application Support/AbletonProjectManager`
pub fn catalog_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| CatalogError::Config {
        message: "Could not determine platform data directory".to_string(),
    })?;
    Ok(data_dir.join(CatalogConfig::APP_DIR_NAME))
}

/// Get the default catalog file path.
///
/// Honors `LIVESET_CATALOG` when set to a non-empty value, otherwise returns
/// `{catalog_data_dir}/projects.json`.
pub fn default_catalog_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CatalogConfig::CATALOG_PATH_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    Ok(catalog_data_dir()?.join(CatalogConfig::CATALOG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_data_dir_contains_app_name() {
        let dir = catalog_data_dir().unwrap();
        assert!(
            dir.ends_with(CatalogConfig::APP_DIR_NAME),
            "Data dir should end with the app dir: {:?}",
            dir
        );
    }

    #[test]
    fn test_default_catalog_path_is_json() {
        let path = default_catalog_path().unwrap();
        assert_eq!(
            path.extension().and_then(|e| e.to_str()),
            Some("json"),
            "Catalog path should be a JSON file: {:?}",
            path
        );
    }
}
