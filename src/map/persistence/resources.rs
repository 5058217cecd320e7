//! Resource types for map persistence state tracking.

use bevy::prelude::*;
use bevy::tasks::Task;
use std::path::PathBuf;

use crate::map::SharedDocument;

use super::results::{LoadResult, SaveResult};

#[derive(Resource, Default)]
pub struct MapLoadError {
    pub message: Option<String>,
}

/// Resource tracking save operation errors for display to user.
#[derive(Resource, Default)]
pub struct MapSaveError {
    pub message: Option<String>,
}

/// Resource tracking async map I/O operations for modal dialog
#[derive(Resource, Default)]
pub struct AsyncMapOperation {
    pub is_saving: bool,
    pub is_loading: bool,
    /// Description of the current operation
    pub operation_description: Option<String>,
}

impl AsyncMapOperation {
    pub fn is_busy(&self) -> bool {
        self.is_saving || self.is_loading
    }
}

#[derive(Component)]
pub struct SaveMapTask(pub Task<SaveResult>);

#[derive(Component)]
pub struct LoadMapTask(pub Task<LoadResult>);

/// Resource tracking the currently loaded map file path
#[derive(Resource, Default)]
pub struct CurrentMapFile {
    pub path: Option<PathBuf>,
}

/// Tracks unsaved changes by comparing document revisions
#[derive(Resource, Default)]
pub struct MapDirtyState {
    /// Document revision at the last save or load
    pub saved_revision: u64,
}

impl MapDirtyState {
    pub fn is_dirty(&self, document: &SharedDocument) -> bool {
        document.revision() != self.saved_revision
    }

    pub fn mark_clean(&mut self, revision: u64) {
        self.saved_revision = revision;
    }
}
