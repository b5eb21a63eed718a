//! Catalog persistence methods on CatalogApi.

use std::sync::Arc;

use crate::api::run_blocking;
use crate::catalog::ReconcileReport;
use crate::error::Result;
use crate::project::ProjectRecord;
use crate::CatalogApi;

impl CatalogApi {
    /// Load the persisted catalog. Missing or malformed catalogs load empty.
    pub async fn load(&self) -> Result<Vec<ProjectRecord>> {
        let store = Arc::clone(&self.store);
        run_blocking("Catalog load", move || Ok(store.load())).await
    }

    /// Load the persisted catalog, failing on an unreadable or malformed file.
    pub async fn try_load(&self) -> Result<Vec<ProjectRecord>> {
        let store = Arc::clone(&self.store);
        run_blocking("Catalog load", move || store.try_load()).await
    }

    /// Replace the persisted catalog with `records`.
    pub async fn save(&self, records: &[ProjectRecord]) -> Result<()> {
        let store = Arc::clone(&self.store);
        let records = records.to_vec();
        run_blocking("Catalog save", move || store.save(&records)).await
    }

    /// Fold the persisted catalog into `records` and persist the result.
    ///
    /// `records` is left untouched when the operation fails.
    pub async fn reconcile(&self, records: &mut Vec<ProjectRecord>) -> Result<ReconcileReport> {
        let store = Arc::clone(&self.store);
        let discoverer = Arc::clone(&self.discoverer);
        let mut current = records.clone();

        let (current, report) = run_blocking("Reconcile", move || {
            let report = store.reconcile(&mut current, &discoverer)?;
            Ok((current, report))
        })
        .await?;

        *records = current;
        Ok(report)
    }

    /// Drop persisted records whose folders no longer exist.
    ///
    /// Returns how many records were removed. The catalog is only rewritten
    /// when something changed.
    pub async fn prune(&self) -> Result<usize> {
        let store = Arc::clone(&self.store);
        run_blocking("Catalog prune", move || store.prune()).await
    }

    /// Remove the persisted catalog.
    pub async fn clear(&self) -> Result<()> {
        let store = Arc::clone(&self.store);
        run_blocking("Catalog clear", move || store.clear()).await
    }
}
