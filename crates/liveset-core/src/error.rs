//! Error types for the Liveset catalog.
//!
//! Folder-scoped failures (decoding, extraction, a missing document) are
//! contained by discovery and reconciliation; storage failures surface to the
//! caller so a front end can present them as user messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the catalog library.
#[derive(Debug, Error)]
pub enum CatalogError {
    // Document decoding errors
    #[error("Decompression failed: {message}")]
    Decompression {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Decompressed document exceeds {limit} bytes")]
    DecompressedTooLarge { limit: u64 },

    #[error("Malformed document at byte {position}: {message}")]
    MalformedDocument { message: String, position: u64 },

    // Extraction errors
    #[error("scale index {index} is outside the lookup table (size {table_len})")]
    ScaleDecode {
        index: i64,
        table_len: usize,
    },

    #[error("No project document found in {0}")]
    MissingDocument(PathBuf),

    // Catalog storage errors
    #[error("Failed to read catalog {path:?}: {message}")]
    StorageRead { path: PathBuf, message: String },

    #[error("Failed to write catalog {path:?}: {message}")]
    StorageWrite { path: PathBuf, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<quick_xml::Error> for CatalogError {
    fn from(err: quick_xml::Error) -> Self {
        CatalogError::MalformedDocument {
            message: err.to_string(),
            position: 0,
        }
    }
}

impl CatalogError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CatalogError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a malformed-document error at a byte offset.
    pub fn malformed(message: impl Into<String>, position: impl TryInto<u64>) -> Self {
        CatalogError::MalformedDocument {
            message: message.into(),
            position: position.try_into().unwrap_or(u64::MAX),
        }
    }

    /// Whether this failure belongs to a single project folder.
    ///
    /// Discovery and reconciliation log and skip these instead of aborting.
    pub fn is_folder_scoped(&self) -> bool {
        matches!(
            self,
            CatalogError::Decompression { .. }
                | CatalogError::DecompressedTooLarge { .. }
                | CatalogError::MalformedDocument { .. }
                | CatalogError::ScaleDecode { .. }
                | CatalogError::MissingDocument(_)
                | CatalogError::Io { .. }
        )
    }

    /// Process exit code for command-line front ends.
    ///
    /// - 2: invalid input path or configuration
    /// - 3: project document could not be decoded
    /// - 4: catalog storage failure
    /// - 1: anything else
    pub fn exit_code(&self) -> i32 {
        match self {
            CatalogError::NotADirectory(_) | CatalogError::Config { .. } => 2,

            CatalogError::Decompression { .. }
            | CatalogError::DecompressedTooLarge { .. }
            | CatalogError::MalformedDocument { .. }
            | CatalogError::ScaleDecode { .. }
            | CatalogError::MissingDocument(_) => 3,

            CatalogError::StorageRead { .. } | CatalogError::StorageWrite { .. } => 4,

            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::ScaleDecode {
            index: 40,
            table_len: 35,
        };
        assert_eq!(
            err.to_string(),
            "scale index 40 is outside the lookup table (size 35)"
        );
    }

    #[test]
    fn test_folder_scoped_errors() {
        assert!(CatalogError::MissingDocument(PathBuf::from("/music/a")).is_folder_scoped());
        assert!(CatalogError::malformed("bad tag", 12usize).is_folder_scoped());
        assert!(!CatalogError::StorageWrite {
            path: PathBuf::from("/tmp/projects.json"),
            message: "disk full".into(),
        }
        .is_folder_scoped());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CatalogError::NotADirectory(PathBuf::from("/nope")).exit_code(),
            2
        );
        assert_eq!(
            CatalogError::DecompressedTooLarge { limit: 10 }.exit_code(),
            3
        );
        assert_eq!(
            CatalogError::StorageRead {
                path: PathBuf::from("projects.json"),
                message: "truncated".into(),
            }
            .exit_code(),
            4
        );
        assert_eq!(CatalogError::Other("boom".into()).exit_code(), 1);
    }
}
