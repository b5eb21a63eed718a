//! The persisted catalog of project records.
//!
//! Records are identified by their folder, compared case-insensitively through
//! [`normalize_path_key`]. Wherever two records for one folder meet, the
//! fresher one wins.

use crate::catalog::atomic::{backup_path, read_json, write_json_atomic, FileLockGuard};
use crate::discovery::{ProjectDiscoverer, SkippedFolder};
use crate::error::{CatalogError, Result};
use crate::project::{normalize_path_key, ProjectRecord};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Outcome of a [`CatalogStore::reconcile`] run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Records re-derived from disk and added to the current set.
    pub refreshed: usize,
    /// Persisted records re-added verbatim because a fresh scan produced nothing.
    pub stale: usize,
    /// Persisted folders that no longer exist; their records were dropped.
    pub missing: Vec<PathBuf>,
    /// Folders whose fresh scan failed or was skipped.
    pub failures: Vec<SkippedFolder>,
}

/// JSON-backed storage for the catalog.
///
/// Writes are serialized in-process by an internal lock and across processes
/// by an advisory lock file next to the catalog. Read-modify-write operations
/// ([`merge_and_save`](Self::merge_and_save), [`prune`](Self::prune),
/// [`reconcile`](Self::reconcile)) hold both locks from load to write, so
/// concurrent callers never drop each other's records.
pub struct CatalogStore {
    path: PathBuf,
    keep_backup: bool,
    /// Lock for serializing writes
    write_lock: RwLock<()>,
}

impl CatalogStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep_backup: true,
            write_lock: RwLock::new(()),
        }
    }

    /// Whether to copy the previous catalog to a `.bak` file on save.
    pub fn with_backup(mut self, keep_backup: bool) -> Self {
        self.keep_backup = keep_backup;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted records.
    ///
    /// A missing catalog is empty. An unreadable or malformed one is logged and
    /// treated as empty.
    pub fn load(&self) -> Vec<ProjectRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                warn!("Discarding unreadable catalog: {}", e);
                Vec::new()
            }
        }
    }

    /// Load the persisted records, surfacing read and parse failures.
    pub fn try_load(&self) -> Result<Vec<ProjectRecord>> {
        debug!("Loading catalog from {}", self.path.display());
        let records = read_json::<Vec<ProjectRecord>>(&self.path).map_err(|e| {
            CatalogError::StorageRead {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(records.unwrap_or_default())
    }

    /// Persist the full record sequence, replacing the previous catalog.
    pub fn save(&self, records: &[ProjectRecord]) -> Result<()> {
        let _locks = self.lock_for_write()?;
        self.write_locked(records)
    }

    /// Merge `fresh` into the persisted catalog and persist the result.
    ///
    /// Returns the merged catalog and how many records were new to it.
    pub fn merge_and_save(&self, fresh: Vec<ProjectRecord>) -> Result<(Vec<ProjectRecord>, usize)> {
        let _locks = self.lock_for_write()?;
        let mut catalog = self.load();
        let added = merge_records(&mut catalog, fresh);
        self.write_locked(&catalog)?;
        Ok((catalog, added))
    }

    /// Drop persisted records whose folders no longer exist.
    ///
    /// The catalog is only rewritten when something changed.
    pub fn prune(&self) -> Result<usize> {
        let _locks = self.lock_for_write()?;
        let mut records = self.try_load()?;
        let removed = prune_missing(&mut records);
        if removed > 0 {
            self.write_locked(&records)?;
        }
        info!("Pruned {} record(s) for missing folders", removed);
        Ok(removed)
    }

    /// Remove the persisted catalog and its backup.
    pub fn clear(&self) -> Result<()> {
        let _lock = self.write_lock.write().map_err(|_| {
            CatalogError::Other("Failed to acquire write lock for catalog".to_string())
        })?;

        for path in [self.path.clone(), backup_path(&self.path)] {
            if path.exists() {
                std::fs::remove_file(&path).map_err(|e| CatalogError::StorageWrite {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            }
        }
        info!("Cleared catalog at {}", self.path.display());
        Ok(())
    }

    /// Fold the persisted catalog back into `current`, then persist `current`.
    ///
    /// Every persisted record whose folder still exists and is not already in
    /// `current` is re-scanned. Fresh records replace it; when the scan yields
    /// nothing or fails, the persisted record is kept as it was. Records for
    /// folders that no longer exist are dropped.
    pub fn reconcile(
        &self,
        current: &mut Vec<ProjectRecord>,
        discoverer: &ProjectDiscoverer,
    ) -> Result<ReconcileReport> {
        let _locks = self.lock_for_write()?;
        let persisted = self.load();
        let mut report = ReconcileReport::default();

        for stale in persisted {
            let folder = stale.project_folder.as_path();
            if !folder.is_dir() {
                debug!("Dropping record for missing folder {}", folder.display());
                report.missing.push(folder.to_path_buf());
                continue;
            }
            if contains_path(current, folder) {
                continue;
            }

            let fresh = match discoverer.discover(folder) {
                Ok(found) => {
                    report.failures.extend(found.skipped);
                    found.records
                }
                Err(e) => {
                    warn!("Failed to rescan {}: {}", folder.display(), e);
                    report.failures.push(SkippedFolder {
                        folder: folder.to_path_buf(),
                        reason: e.to_string(),
                    });
                    Vec::new()
                }
            };

            if fresh.is_empty() {
                warn!("Keeping stale record for {}", folder.display());
                current.push(stale);
                report.stale += 1;
                continue;
            }

            for record in fresh {
                if !contains_path(current, &record.project_folder) {
                    current.push(record);
                    report.refreshed += 1;
                }
            }
        }

        self.write_locked(current.as_slice())?;
        info!(
            "Reconciled catalog: {} refreshed, {} stale, {} missing",
            report.refreshed,
            report.stale,
            report.missing.len()
        );
        Ok(report)
    }

    /// Take the in-process write lock, then the lock file.
    fn lock_for_write(&self) -> Result<(RwLockWriteGuard<'_, ()>, FileLockGuard)> {
        let lock = self.write_lock.write().map_err(|_| {
            CatalogError::Other("Failed to acquire write lock for catalog".to_string())
        })?;
        let file_lock = FileLockGuard::acquire(&self.path).map_err(|e| self.write_error(e))?;
        Ok((lock, file_lock))
    }

    /// Write `records`; the caller holds [`Self::lock_for_write`].
    fn write_locked(&self, records: &[ProjectRecord]) -> Result<()> {
        debug!("Saving {} record(s) to {}", records.len(), self.path.display());
        write_json_atomic(&self.path, &records, self.keep_backup).map_err(|e| self.write_error(e))
    }

    fn write_error(&self, err: CatalogError) -> CatalogError {
        CatalogError::StorageWrite {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

/// Whether `records` already holds an entry for `folder` (case-insensitive).
pub fn contains_path(records: &[ProjectRecord], folder: &Path) -> bool {
    let key = normalize_path_key(folder);
    records.iter().any(|r| r.path_key() == key)
}

/// Merge `fresh` into `current` in place.
///
/// A fresh record replaces the existing record for the same folder; records
/// for new folders are appended. Returns how many were appended.
pub fn merge_records(current: &mut Vec<ProjectRecord>, fresh: Vec<ProjectRecord>) -> usize {
    let mut added = 0;
    for record in fresh {
        let key = record.path_key();
        match current.iter_mut().find(|r| r.path_key() == key) {
            Some(existing) => *existing = record,
            None => {
                current.push(record);
                added += 1;
            }
        }
    }
    added
}

/// Drop records whose folder no longer exists. Returns how many were dropped.
pub fn prune_missing(records: &mut Vec<ProjectRecord>) -> usize {
    let before = records.len();
    records.retain(|r| r.project_folder.is_dir());
    before - records.len()
}
