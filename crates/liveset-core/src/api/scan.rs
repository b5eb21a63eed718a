//! Discovery methods on CatalogApi.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::info;

use crate::api::run_blocking;
use crate::discovery::{DiscoveryReport, ProjectDiscoverer, SkippedFolder};
use crate::error::{CatalogError, Result};
use crate::project::ProjectRecord;
use crate::CatalogApi;

/// Result of [`CatalogApi::scan_and_save`].
#[derive(Debug)]
pub struct ScanOutcome {
    /// The catalog as persisted after the merge.
    pub catalog: Vec<ProjectRecord>,
    /// Records for folders the catalog did not know before.
    pub added: usize,
    /// What the scan found and skipped.
    pub report: DiscoveryReport,
}

/// How a root folder is scanned.
enum RootPlan {
    /// The root is a project folder, or scanning is sequential.
    Done(DiscoveryReport),
    /// Independent subdirectories to scan concurrently.
    Branches(Vec<PathBuf>),
}

impl CatalogApi {
    /// Discover every project under `root`.
    ///
    /// With [`ScanOptions::parallel`](crate::ScanOptions) set, each immediate
    /// subdirectory is scanned on its own blocking task. Reports are joined in
    /// sorted directory order either way, so the result does not depend on
    /// scheduling.
    pub async fn discover(&self, root: impl AsRef<Path>) -> Result<DiscoveryReport> {
        let root = root.as_ref().to_path_buf();
        let discoverer = Arc::clone(&self.discoverer);

        let plan = {
            let discoverer = Arc::clone(&discoverer);
            let root = root.clone();
            run_blocking("Discovery", move || plan_root(&discoverer, &root)).await?
        };

        let branches = match plan {
            RootPlan::Done(report) => return Ok(report),
            RootPlan::Branches(branches) => branches,
        };

        let tasks = branches.into_iter().map(|branch| {
            let discoverer = Arc::clone(&discoverer);
            async move {
                let folder = branch.clone();
                tokio::task::spawn_blocking(move || discoverer.discover_branch(&branch))
                    .await
                    .unwrap_or_else(|e| DiscoveryReport {
                        records: Vec::new(),
                        skipped: vec![SkippedFolder {
                            folder,
                            reason: format!("Discovery task failed: {}", e),
                        }],
                    })
            }
        });

        let mut report = DiscoveryReport::default();
        for branch in join_all(tasks).await {
            report.extend(branch);
        }

        info!(
            "Discovered {} project(s) under {} ({} skipped)",
            report.records.len(),
            root.display(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Decode a single project folder.
    pub async fn load_project(&self, folder: impl AsRef<Path>) -> Result<ProjectRecord> {
        let discoverer = Arc::clone(&self.discoverer);
        let folder = folder.as_ref().to_path_buf();
        run_blocking("Project load", move || discoverer.load_project(&folder)).await
    }

    /// Discover projects under `root` and merge them into the persisted catalog.
    ///
    /// Fresh records replace persisted ones for the same folder.
    pub async fn scan_and_save(&self, root: impl AsRef<Path>) -> Result<ScanOutcome> {
        let report = self.discover(root).await?;

        let store = Arc::clone(&self.store);
        let fresh = report.records.clone();
        let (catalog, added) =
            run_blocking("Catalog merge", move || store.merge_and_save(fresh)).await?;

        Ok(ScanOutcome {
            catalog,
            added,
            report,
        })
    }
}

fn plan_root(discoverer: &ProjectDiscoverer, root: &Path) -> Result<RootPlan> {
    if !discoverer.options().parallel {
        return discoverer.discover(root).map(RootPlan::Done);
    }
    if !root.is_dir() {
        return Err(CatalogError::NotADirectory(root.to_path_buf()));
    }
    if discoverer.find_document(root)?.is_some() {
        return discoverer.discover(root).map(RootPlan::Done);
    }
    Ok(RootPlan::Branches(discoverer.subdirectories(root)?))
}
