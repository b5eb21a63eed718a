//! API implementation submodules.
//!
//! Each submodule contains `impl CatalogApi` blocks that extend the public API
//! with domain-specific methods. The struct definition remains in `lib.rs`.

mod builder;
mod catalog;
mod documents;
mod scan;

pub use builder::CatalogApiBuilder;
pub use documents::StripOutcome;
pub use scan::ScanOutcome;

use crate::error::{CatalogError, Result};

/// Run filesystem work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(what: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CatalogError::Other(format!("{} task failed: {}", what, e)))?
}
