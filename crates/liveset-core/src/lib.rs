//! Liveset Catalog - Headless library for cataloging Ableton Live project folders.
//!
//! This crate finds project folders on disk, decodes their compressed
//! documents, extracts tempo, scale and modification time, and keeps the
//! result in a JSON catalog that survives folders becoming temporarily
//! unreadable. It also reads folder tags from XMP sidecar files and can strip
//! named devices from a document.
//!
//! # Example
//!
//! ```rust,ignore
//! use liveset_catalog::CatalogApi;
//!
//! #[tokio::main]
//! async fn main() -> liveset_catalog::Result<()> {
//!     let api = CatalogApi::open_default().await?;
//!
//!     // Scan a folder tree and merge the results into the catalog
//!     let outcome = api.scan_and_save("/home/me/Music/Ableton").await?;
//!     println!("Catalog holds {} projects", outcome.catalog.len());
//!
//!     // Re-read persisted folders, keeping stale entries that fail to scan
//!     let mut records = Vec::new();
//!     let report = api.reconcile(&mut records).await?;
//!     println!("{} refreshed, {} stale", report.refreshed, report.stale);
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod devices;
pub mod discovery;
pub mod document;
pub mod error;
pub mod platform;
pub mod project;
pub mod sidecar;

mod api;

// Re-export commonly used types
pub use catalog::{CatalogStore, ReconcileReport};
pub use config::{CatalogConfig, DocumentConfig, ScanOptions};
pub use devices::{filter_devices, remove_devices};
pub use discovery::{DiscoveryReport, ProjectDiscoverer, SkippedFolder};
pub use document::{decode, DecodedDocument, GenericNode, XmlDocument, XmlElement};
pub use error::{CatalogError, Result};
pub use project::ProjectRecord;
pub use sidecar::{extract_tags, TagRecord};

// Re-export builder and result types from api module
pub use api::{CatalogApiBuilder, ScanOutcome, StripOutcome};

use std::path::PathBuf;
use std::sync::Arc;

/// Main API struct for catalog operations.
///
/// This is the entry point a front end talks to. Filesystem work runs on the
/// blocking thread pool, so every method is safe to await from async code.
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct CatalogApi {
    store: Arc<CatalogStore>,
    discoverer: Arc<ProjectDiscoverer>,
}

impl CatalogApi {
    /// Create a builder for CatalogApi.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let api = CatalogApi::builder("/tmp/projects.json")
    ///     .auto_create_dirs(true)
    ///     .keep_backup(false)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder(catalog_path: impl Into<PathBuf>) -> CatalogApiBuilder {
        CatalogApiBuilder::new(catalog_path)
    }

    /// Create a CatalogApi backed by the catalog file at `catalog_path`.
    ///
    /// The file's parent directory must already exist.
    pub async fn new(catalog_path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(catalog_path).build().await
    }

    /// Create a CatalogApi at the platform default catalog location.
    ///
    /// The per-user data directory is created if it does not exist yet.
    pub async fn open_default() -> Result<Self> {
        Self::builder(platform::default_catalog_path()?)
            .auto_create_dirs(true)
            .build()
            .await
    }

    /// Path of the catalog file.
    pub fn catalog_path(&self) -> &std::path::Path {
        self.store.path()
    }

    /// Options used for discovery.
    pub fn scan_options(&self) -> &ScanOptions {
        self.discoverer.options()
    }
}
