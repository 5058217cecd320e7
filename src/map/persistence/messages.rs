//! Message types for map persistence operations.

use bevy::prelude::*;
use std::path::PathBuf;

use crate::map::MapDocument;

#[derive(Message)]
pub struct SaveMapRequest {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct LoadMapRequest {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct NewMapRequest;

/// A document is ready to replace the open one
#[derive(Message)]
pub struct MapLoaded {
    pub document: MapDocument,
    /// File the document came from (`None` for a new map)
    pub path: Option<PathBuf>,
}
