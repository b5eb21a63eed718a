//! Recursive discovery of project folders.
//!
//! A project folder directly contains at least one project document. The walk
//! stops at the first project folder on every branch: its subfolders (such as
//! Live's `Backup/`) are never cataloged as projects of their own.
//!
//! Directory listings are sorted by file name, so the document chosen for a
//! folder with several documents is the lexicographically first one on every
//! platform. Symbolic links are not followed, for files or directories.

use crate::config::ScanOptions;
use crate::document::decode_file;
use crate::error::{CatalogError, Result};
use crate::project::{extract, ProjectRecord};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// A folder that was skipped during discovery, and why.
#[derive(Debug, Clone)]
pub struct SkippedFolder {
    pub folder: PathBuf,
    pub reason: String,
}

/// Records found by a discovery run plus the folders it had to skip.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub records: Vec<ProjectRecord>,
    pub skipped: Vec<SkippedFolder>,
}

impl DiscoveryReport {
    /// Append another report, keeping order.
    pub fn extend(&mut self, other: DiscoveryReport) {
        self.records.extend(other.records);
        self.skipped.extend(other.skipped);
    }

    fn skip(&mut self, folder: &Path, err: &CatalogError) {
        if err.is_folder_scoped() {
            warn!("Error loading project from {}: {}", folder.display(), err);
        } else {
            error!("Unexpected failure in {}: {}", folder.display(), err);
        }
        self.skipped.push(SkippedFolder {
            folder: folder.to_path_buf(),
            reason: err.to_string(),
        });
    }
}

/// Walks directory trees and turns project folders into records.
#[derive(Debug, Clone, Default)]
pub struct ProjectDiscoverer {
    options: ScanOptions,
}

impl ProjectDiscoverer {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Discover every project under `root`.
    ///
    /// A root that is itself a project folder yields only its own record; its
    /// subdirectories are not scanned.
    ///
    /// Fails only when `root` is not a readable directory. Per-folder failures
    /// are logged and listed in [`DiscoveryReport::skipped`].
    pub fn discover(&self, root: &Path) -> Result<DiscoveryReport> {
        if !root.is_dir() {
            return Err(CatalogError::NotADirectory(root.to_path_buf()));
        }
        // Surface an unreadable root instead of reporting an empty scan.
        std::fs::read_dir(root).map_err(|e| CatalogError::io_with_path(e, root))?;

        let report = self.discover_branch(root);
        info!(
            "Discovered {} project(s) under {} ({} skipped)",
            report.records.len(),
            root.display(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Apply the discovery rule to one folder without the root checks.
    ///
    /// A project folder yields its own record; any other folder is searched
    /// through its subdirectories. Branches share no state, so callers may run
    /// sibling branches concurrently and concatenate the reports.
    pub fn discover_branch(&self, folder: &Path) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        match self.find_document(folder) {
            Ok(Some(document)) => self.load_into(folder, &document, &mut report),
            Ok(None) => match self.subdirectories(folder) {
                Ok(subdirs) => {
                    for subdir in subdirs {
                        report.extend(self.discover_branch(&subdir));
                    }
                }
                Err(e) => report.skip(folder, &e),
            },
            Err(e) => report.skip(folder, &e),
        }

        report
    }

    /// The project document of `folder`, first by file name; not recursive.
    pub fn find_document(&self, folder: &Path) -> Result<Option<PathBuf>> {
        for entry in Self::listing(folder) {
            let entry = entry.map_err(|e| walk_error(e, folder))?;
            if entry.file_type().is_file() && self.options.is_document_name(entry.file_name()) {
                return Ok(Some(entry.into_path()));
            }
        }
        Ok(None)
    }

    /// Immediate subdirectories of `folder`, sorted by name.
    pub fn subdirectories(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in Self::listing(folder) {
            let entry = entry.map_err(|e| walk_error(e, folder))?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }
        Ok(dirs)
    }

    /// Decode one project folder into a record.
    pub fn load_project(&self, folder: &Path) -> Result<ProjectRecord> {
        let document = self
            .find_document(folder)?
            .ok_or_else(|| CatalogError::MissingDocument(folder.to_path_buf()))?;
        self.load_document(folder, &document)
    }

    fn load_document(&self, folder: &Path, document: &Path) -> Result<ProjectRecord> {
        debug!("Loading project from {} ({})", folder.display(), document.display());

        let modified = std::fs::metadata(document)
            .and_then(|meta| meta.modified())
            .map_err(|e| CatalogError::io_with_path(e, document))?;

        let decoded = decode_file(document, self.options.max_decompressed_bytes)?;
        extract(
            &decoded.document,
            &decoded.tree,
            folder,
            DateTime::<Utc>::from(modified),
        )
    }

    fn load_into(&self, folder: &Path, document: &Path, report: &mut DiscoveryReport) {
        match self.load_document(folder, document) {
            Ok(record) => report.records.push(record),
            Err(e) => report.skip(folder, &e),
        }
    }

    fn listing(folder: &Path) -> walkdir::IntoIter {
        WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
    }
}

fn walk_error(err: walkdir::Error, folder: &Path) -> CatalogError {
    let path = err.path().unwrap_or(folder).to_path_buf();
    match err.into_io_error() {
        Some(io) => CatalogError::io_with_path(io, path),
        None => CatalogError::Io {
            message: "filesystem loop detected".to_string(),
            path: Some(path),
            source: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_project, write_raw_document, SetFixture};
    use tempfile::TempDir;

    fn titles(report: &DiscoveryReport) -> Vec<&str> {
        report.records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_discovers_nested_projects() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_project(&root.join("2023/Alpha Project"), "Alpha", &SetFixture::tempo(120.0));
        write_project(&root.join("2024/March/Beta Project"), "Beta", &SetFixture::tempo(90.0));
        std::fs::create_dir_all(root.join("Empty/Deeper")).unwrap();

        let report = ProjectDiscoverer::default().discover(root).unwrap();
        assert_eq!(titles(&report), vec!["Alpha Project", "Beta Project"]);
        assert_eq!(report.records[0].bpm, 120.0);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_never_descends_into_project_folder() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("Gamma Project");
        write_project(&project, "Gamma", &SetFixture::default());
        write_project(&project.join("Backup"), "Gamma [2024-01-01 101010]", &SetFixture::default());
        write_project(&project.join("Sketches/Inner"), "Inner", &SetFixture::default());

        // From above, and rooted at the project itself.
        let report = ProjectDiscoverer::default().discover(temp_dir.path()).unwrap();
        assert_eq!(titles(&report), vec!["Gamma Project"]);

        let report = ProjectDiscoverer::default().discover(&project).unwrap();
        assert_eq!(titles(&report), vec!["Gamma Project"]);
    }

    #[test]
    fn test_first_document_by_name_wins() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("Delta Project");
        write_project(&project, "b-take", &SetFixture::tempo(100.0));
        write_project(&project, "a-take", &SetFixture::tempo(140.0));

        let discoverer = ProjectDiscoverer::default();
        let document = discoverer.find_document(&project).unwrap().unwrap();
        assert_eq!(document.file_name().unwrap(), "a-take.als");
        assert_eq!(discoverer.load_project(&project).unwrap().bpm, 140.0);
    }

    #[test]
    fn test_corrupt_project_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_raw_document(&root.join("Broken Project"), "Broken", b"not gzip at all");
        write_project(&root.join("Good Project"), "Good", &SetFixture::default());
        write_project(
            &root.join("Overflow Project"),
            "Overflow",
            &SetFixture::scale(0, 77),
        );

        let report = ProjectDiscoverer::default().discover(root).unwrap();
        assert_eq!(titles(&report), vec!["Good Project"]);
        let skipped: Vec<_> = report
            .skipped
            .iter()
            .map(|s| s.folder.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(skipped, vec!["Broken Project", "Overflow Project"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = ProjectDiscoverer::default()
            .discover(&temp_dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotADirectory(_)));
    }

    #[test]
    fn test_load_project_without_document() {
        let temp_dir = TempDir::new().unwrap();
        let err = ProjectDiscoverer::default()
            .load_project(temp_dir.path())
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingDocument(_)));
    }

    #[test]
    fn test_custom_document_extension() {
        let temp_dir = TempDir::new().unwrap();
        write_project(&temp_dir.path().join("Epsilon Project"), "Epsilon", &SetFixture::default());

        let options = ScanOptions {
            document_extension: "alc".to_string(),
            ..ScanOptions::default()
        };
        let report = ProjectDiscoverer::new(options).discover(temp_dir.path()).unwrap();
        assert!(report.records.is_empty());
    }
}
