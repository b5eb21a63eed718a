//! Catalog persistence.

mod atomic;
mod store;

pub use atomic::{backup_path, read_json, write_json_atomic, FileLockGuard};
pub use store::{contains_path, merge_records, prune_missing, CatalogStore, ReconcileReport};
