//! Builder for configuring CatalogApi initialization.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::config::ScanOptions;
use crate::discovery::ProjectDiscoverer;
use crate::error::{CatalogError, Result};
use crate::CatalogApi;

/// Builder for configuring CatalogApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use liveset_catalog::{CatalogApi, ScanOptions};
///
/// let api = CatalogApi::builder("./projects.json")
///     .auto_create_dirs(true)
///     .scan_options(ScanOptions { parallel: false, ..ScanOptions::default() })
///     .build()
///     .await?;
/// ```
pub struct CatalogApiBuilder {
    catalog_path: PathBuf,
    scan_options: ScanOptions,
    keep_backup: bool,
    auto_create_dirs: bool,
}

impl CatalogApiBuilder {
    /// Create a new builder for the catalog file at `catalog_path`.
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            scan_options: ScanOptions::default(),
            keep_backup: true,
            auto_create_dirs: false,
        }
    }

    /// Options used by every discovery and reconcile call.
    ///
    /// Default: [`ScanOptions::default`]
    pub fn scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    /// Keep a `.bak` copy of the previous catalog on every save.
    ///
    /// Default: `true`
    pub fn keep_backup(mut self, enable: bool) -> Self {
        self.keep_backup = enable;
        self
    }

    /// Create the catalog's parent directory if it doesn't exist.
    ///
    /// Default: `false` (the directory must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Build the CatalogApi instance.
    pub async fn build(self) -> Result<CatalogApi> {
        if self.scan_options.document_extension.trim().is_empty() {
            return Err(CatalogError::Config {
                message: "Document extension must not be empty".to_string(),
            });
        }

        if let Some(parent) = self.catalog_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                if self.auto_create_dirs {
                    std::fs::create_dir_all(parent).map_err(|e| CatalogError::Io {
                        message: format!("Failed to create catalog directory: {}", parent.display()),
                        path: Some(parent.to_path_buf()),
                        source: Some(e),
                    })?;
                } else {
                    return Err(CatalogError::Config {
                        message: format!("Catalog directory does not exist: {}", parent.display()),
                    });
                }
            }
        }

        tracing::debug!("Using catalog at {}", self.catalog_path.display());
        let store = CatalogStore::new(self.catalog_path).with_backup(self.keep_backup);

        Ok(CatalogApi {
            store: Arc::new(store),
            discoverer: Arc::new(ProjectDiscoverer::new(self.scan_options)),
        })
    }
}
