//! Map persistence: saving and loading map documents.
//!
//! File I/O runs on the IO task pool and is polled once per frame. A
//! completed load does not touch the open document directly; it sends
//! [`MapLoaded`], which [`apply_loaded_map`] handles in
//! [`MapSystems::Apply`] so other plugins can release the old document
//! first and redraw against the new one afterwards.
//!
//! ## Module Structure
//!
//! - [`messages`] - Message types for map operations
//! - [`resources`] - Resource types for state tracking
//! - [`results`] - Result types for async operations
//! - [`io`] - Document file format
//! - [`save`] - Save system and task polling
//! - [`load`] - Load system, task polling and document replacement
//! - [`map_state`] - New map system

mod io;
mod load;
mod map_state;
mod messages;
mod resources;
mod results;
mod save;

#[cfg(test)]
mod tests;

use bevy::prelude::*;

pub use messages::{LoadMapRequest, MapLoaded, NewMapRequest, SaveMapRequest};

pub use resources::{AsyncMapOperation, CurrentMapFile, MapDirtyState, MapLoadError, MapSaveError};

pub use io::{ensure_maps_directory, read_document, write_document};

pub use load::{apply_loaded_map, load_map_system, poll_load_tasks};
pub use map_state::new_map_system;
pub use save::{poll_save_tasks, save_map_system};

/// Ordering of map document changes within a frame
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapSystems {
    /// Start and poll file I/O
    Io,
    /// Swap the open document
    Apply,
}
