//! Tag extraction from the XMP sidecar files Live keeps next to a project.
//!
//! Live writes folder info as RDF inside `Ableton Folder Info/*.xmp`:
//!
//! ```text
//! rdf:Description
//!   ablFR:items / rdf:Bag / rdf:li
//!     ablFR:keywords / rdf:Bag / rdf:li   "Group|Label"
//! ```
//!
//! Elements are matched by local name so prefix choices do not matter.

use crate::config::DocumentConfig;
use crate::document::{parse_document, XmlElement};
use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Display variant attached to every extracted tag.
pub const TAG_VARIANT: &str = "outline";

/// Separator between group and label in a raw keyword.
pub const TAG_DELIMITER: char = '|';

/// One keyword from a sidecar file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    /// The undivided keyword string; unique per extraction.
    pub raw_value: String,
    pub label: String,
    pub group: String,
    pub variant: String,
}

impl TagRecord {
    /// Split `"Group|Label"` into its parts. Missing parts are empty.
    ///
    /// Only the first delimiter splits; the label keeps any later ones.
    pub fn from_raw(raw: &str) -> Self {
        let mut parts = raw.splitn(2, TAG_DELIMITER);
        let group = parts.next().unwrap_or_default().to_string();
        let label = parts.next().unwrap_or_default().to_string();
        Self {
            raw_value: raw.to_string(),
            label,
            group,
            variant: TAG_VARIANT.to_string(),
        }
    }
}

/// Extract tags from every sidecar file of a project folder.
///
/// A missing sidecar folder yields no tags. A file that cannot be read or
/// parsed is logged and skipped; the others still contribute. Tags are
/// deduplicated by raw value, first occurrence wins.
pub fn extract_tags(project_folder: &Path) -> Vec<TagRecord> {
    let sidecar_dir = project_folder.join(DocumentConfig::SIDECAR_DIR_NAME);
    if !sidecar_dir.is_dir() {
        debug!("No sidecar folder at {}", sidecar_dir.display());
        return Vec::new();
    }

    let files = match sidecar_files(&sidecar_dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list {}: {}", sidecar_dir.display(), e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for file in files {
        match read_keywords(&file) {
            Ok(keywords) => {
                for keyword in keywords {
                    if seen.insert(keyword.clone()) {
                        tags.push(TagRecord::from_raw(&keyword));
                    }
                }
            }
            Err(e) => warn!("Error parsing sidecar file {}: {}", file.display(), e),
        }
    }
    tags
}

/// Sidecar files in a folder, sorted by file name.
fn sidecar_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CatalogError::io_with_path(e, dir))? {
        let path = entry?.path();
        let is_sidecar = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(DocumentConfig::SIDECAR_EXTENSION))
            .unwrap_or(false);
        if is_sidecar && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_keywords(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| CatalogError::io_with_path(e, path))?;
    parse_keywords(&text)
}

/// Keyword strings from sidecar markup, in document order.
///
/// A document without the items/keywords structure yields an empty list.
pub fn parse_keywords(text: &str) -> Result<Vec<String>> {
    let document = parse_document(text)?;
    let root = document.root();

    let descriptions = std::iter::once(root)
        .chain(root.descendants())
        .filter(|element| element.local_name() == "Description");

    let mut keywords = Vec::new();
    for description in descriptions {
        for item in bag_items(description, "items") {
            for keyword_leaf in bag_items(item, "keywords") {
                let value = keyword_leaf.text();
                let value = value.trim();
                if !value.is_empty() {
                    keywords.push(value.to_string());
                }
            }
        }
    }
    Ok(keywords)
}

/// `<container>/<Bag>/<li>` children of `parent`.
fn bag_items<'a>(
    parent: &'a XmlElement,
    container: &'a str,
) -> impl Iterator<Item = &'a XmlElement> + 'a {
    parent
        .children_local(container)
        .flat_map(|c| c.children_local("Bag"))
        .flat_map(|bag| bag.children_local("li"))
}
