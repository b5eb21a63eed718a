//! Project records and metadata extraction.

mod extract;
mod record;
pub mod scale;

pub use extract::{extract, read_scale, read_tempo};
pub use record::{normalize_path_key, ProjectRecord};
