//! Result types for async map operations.

use std::path::PathBuf;

use crate::error::Result;
use crate::map::MapDocument;

/// Result of an async save operation
pub struct SaveResult {
    pub path: PathBuf,
    /// Document revision that was written
    pub revision: u64,
    pub outcome: Result<()>,
}

/// Result of an async load operation
pub struct LoadResult {
    pub path: PathBuf,
    pub outcome: Result<MapDocument>,
}
