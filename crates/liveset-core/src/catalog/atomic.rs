//! Atomic file operations for the catalog file.
//!
//! Writes go to a temp file with a PID+TID suffix, are fsynced, optionally
//! back up the previous file, and are then renamed over the target.

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use tracing::{debug, warn};

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if reading or parsing fails.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|e| CatalogError::Io {
        message: format!("Failed to read {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    let data: T = serde_json::from_str(&contents).map_err(|e| CatalogError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically.
///
/// 1. Serializes with pretty printing and validates by re-parsing
/// 2. Writes a temp file next to the target and fsyncs it
/// 3. Optionally copies the current target to `.json.bak`
/// 4. Renames the temp file over the target
pub fn write_json_atomic<T: Serialize>(path: &Path, data: &T, keep_backup: bool) -> Result<()> {
    ensure_parent(path)?;

    let temp_path = path.with_extension(format!("json.{}.{}.tmp", process::id(), thread_id()));

    let serialized = serde_json::to_string_pretty(data).map_err(|e| CatalogError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    serde_json::from_str::<serde_json::Value>(&serialized).map_err(|e| CatalogError::Json {
        message: format!("JSON validation failed: {}", e),
        source: Some(e),
    })?;

    if let Err(e) = write_synced(&temp_path, serialized.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if keep_backup && path.exists() {
        let backup_path = backup_path(path);
        if let Err(e) = fs::copy(path, &backup_path) {
            // Backup failure is not fatal
            warn!("Failed to create backup {}: {}", backup_path.display(), e);
        } else {
            debug!("Created backup: {}", backup_path.display());
        }
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CatalogError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Backup location for a catalog file.
pub fn backup_path(path: &Path) -> PathBuf {
    path.with_extension(CatalogConfig::BACKUP_EXTENSION)
}

/// Exclusive advisory lock held for the lifetime of the guard.
///
/// Serializes writers across processes; in-process writers are serialized by
/// the store's own lock before this is taken.
pub struct FileLockGuard {
    file: File,
    path: PathBuf,
}

impl FileLockGuard {
    /// Block until the lock file next to `target` is exclusively held.
    pub fn acquire(target: &Path) -> Result<Self> {
        ensure_parent(target)?;
        let path = target.with_extension(CatalogConfig::LOCK_EXTENSION);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| CatalogError::io_with_path(e, &path))?;
        FileExt::lock_exclusive(&file).map_err(|e| CatalogError::io_with_path(e, &path))?;
        Ok(Self { file, path })
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| CatalogError::Io {
                message: format!("Failed to create directory {}", parent.display()),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |e: std::io::Error, what: &str| CatalogError::Io {
        message: format!("Failed to {} temp file {}", what, path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| io_err(e, "create"))?;
    file.write_all(bytes).map_err(|e| io_err(e, "write"))?;
    file.flush().map_err(|e| io_err(e, "flush"))?;
    file.sync_all().map_err(|e| io_err(e, "sync"))?;
    Ok(())
}

/// Get a unique thread identifier.
fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    format!("{:?}", thread::current().id()).hash(&mut hasher);
    hasher.finish()
}
