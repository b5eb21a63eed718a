//! Per-document methods on CatalogApi: tags, device stripping and dumps.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::api::run_blocking;
use crate::devices::filter_devices;
use crate::document::{decode_file, encode_document, write_document};
use crate::error::{CatalogError, Result};
use crate::sidecar::{extract_tags, TagRecord};
use crate::CatalogApi;

/// Result of [`CatalogApi::strip_devices`].
#[derive(Debug)]
pub struct StripOutcome {
    /// Number of device elements detached.
    pub removed: usize,
    /// The filtered document as indented markup text.
    pub text: String,
    /// Where the filtered document was written, if anywhere.
    pub written_to: Option<PathBuf>,
}

impl CatalogApi {
    /// Folder tags from the project's sidecar files.
    pub async fn tags(&self, project_folder: impl AsRef<Path>) -> Result<Vec<TagRecord>> {
        let folder = project_folder.as_ref().to_path_buf();
        run_blocking("Tag extraction", move || Ok(extract_tags(&folder))).await
    }

    /// Remove devices whose `Value` is in `values` from a project document.
    ///
    /// The source document is never modified. With `output` set, the result is
    /// written there: compressed when `output` carries the document extension,
    /// as plain markup otherwise.
    pub async fn strip_devices(
        &self,
        document: impl AsRef<Path>,
        values: HashSet<String>,
        output: Option<PathBuf>,
    ) -> Result<StripOutcome> {
        let discoverer = Arc::clone(&self.discoverer);
        let document = document.as_ref().to_path_buf();

        run_blocking("Device removal", move || {
            let options = discoverer.options();
            let decoded = decode_file(&document, options.max_decompressed_bytes)?;
            let (filtered, removed) = filter_devices(&decoded.document, &values);
            let text = write_document(&filtered)?;
            info!("Removed {} device element(s) from {}", removed, document.display());

            if let Some(path) = &output {
                if path == &document {
                    return Err(CatalogError::Config {
                        message: format!("Refusing to overwrite source {}", document.display()),
                    });
                }
                let bytes = match path.file_name() {
                    Some(name) if options.is_document_name(name) => encode_document(&text)?,
                    _ => text.clone().into_bytes(),
                };
                std::fs::write(path, bytes).map_err(|e| CatalogError::io_with_path(e, path))?;
            }

            Ok(StripOutcome {
                removed,
                text,
                written_to: output,
            })
        })
        .await
    }

    /// The generic tree of a project document rendered as JSON.
    pub async fn dump_document(&self, document: impl AsRef<Path>) -> Result<serde_json::Value> {
        let max_bytes = self.discoverer.options().max_decompressed_bytes;
        let document = document.as_ref().to_path_buf();
        run_blocking("Document dump", move || {
            Ok(decode_file(&document, max_bytes)?.tree.to_json())
        })
        .await
    }
}
