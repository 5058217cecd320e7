//! Map document file format (pretty-printed JSON).

use bevy::prelude::*;
use std::path::Path;

use crate::error::{FogError, Result};
use crate::fog::store::RevealStore;
use crate::map::{MapDocument, SharedDocument};

/// Copy of the open document as it should be written to disk, and the
/// revision it was taken at
pub fn save_snapshot(document: &SharedDocument) -> (MapDocument, u64) {
    let (mut snapshot, revision) = document.snapshot();
    RevealStore::strip_unpersisted(&mut snapshot);
    (snapshot, revision)
}

pub fn write_document(path: &Path, document: &MapDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json).map_err(|source| FogError::DocumentWrite {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_document(path: &Path) -> Result<MapDocument> {
    let json = std::fs::read_to_string(path).map_err(|source| FogError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

pub fn ensure_maps_directory() {
    let maps_dir = crate::paths::maps_dir();
    if !maps_dir.exists()
        && let Err(e) = std::fs::create_dir_all(&maps_dir)
    {
        warn!("Failed to create maps directory: {}", e);
    }
}
