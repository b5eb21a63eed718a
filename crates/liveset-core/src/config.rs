//! Centralized configuration for the Liveset catalog.
//!
//! Fixed constants live on unit structs; values a caller may tune per run are
//! carried by [`ScanOptions`] and passed into entry points explicitly.

use serde::{Deserialize, Serialize};

/// Catalog persistence configuration.
pub struct CatalogConfig;

impl CatalogConfig {
    /// Directory under the per-user data dir. Shared with earlier releases.
    pub const APP_DIR_NAME: &'static str = "AbletonProjectManager";
    pub const CATALOG_FILENAME: &'static str = "projects.json";
    pub const BACKUP_EXTENSION: &'static str = "json.bak";
    pub const LOCK_EXTENSION: &'static str = "json.lock";
    /// Environment variable that overrides the catalog location.
    pub const CATALOG_PATH_ENV: &'static str = "LIVESET_CATALOG";
}

/// Project document and sidecar conventions.
pub struct DocumentConfig;

impl DocumentConfig {
    pub const DOCUMENT_EXTENSION: &'static str = "als";
    pub const SIDECAR_DIR_NAME: &'static str = "Ableton Folder Info";
    pub const SIDECAR_EXTENSION: &'static str = "xmp";
    pub const MAX_DECOMPRESSED_BYTES: u64 = 512 * 1024 * 1024; // 512MB
    pub const INDENT_WIDTH: usize = 2;
}

/// Per-run scanning options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    /// Extension (without dot) that marks a project document.
    pub document_extension: String,
    /// Upper bound on the decompressed size of a single document.
    pub max_decompressed_bytes: u64,
    /// Scan sibling branches of the root concurrently.
    pub parallel: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            document_extension: DocumentConfig::DOCUMENT_EXTENSION.to_string(),
            max_decompressed_bytes: DocumentConfig::MAX_DECOMPRESSED_BYTES,
            parallel: true,
        }
    }
}

impl ScanOptions {
    /// Whether a file name carries the project document extension.
    pub fn is_document_name(&self, file_name: &std::ffi::OsStr) -> bool {
        std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.document_extension))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_document_name_matching() {
        let options = ScanOptions::default();
        assert!(options.is_document_name(OsStr::new("Song.als")));
        assert!(options.is_document_name(OsStr::new("SONG.ALS")));
        assert!(!options.is_document_name(OsStr::new("Song.als.bak")));
        assert!(!options.is_document_name(OsStr::new("als")));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ScanOptions = serde_json::from_str(r#"{"parallel": false}"#).unwrap();
        assert!(!options.parallel);
        assert_eq!(options.document_extension, "als");
        assert_eq!(
            options.max_decompressed_bytes,
            DocumentConfig::MAX_DECOMPRESSED_BYTES
        );
    }
}
