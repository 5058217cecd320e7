//! New map system.

use bevy::prelude::*;

use crate::map::MapDocument;

use super::messages::{MapLoaded, NewMapRequest};

/// Replaces the open map with a blank document
pub fn new_map_system(
    mut events: MessageReader<NewMapRequest>,
    mut loaded_events: MessageWriter<MapLoaded>,
) {
    for _ in events.read() {
        info!("Creating new map");
        loaded_events.write(MapLoaded {
            document: MapDocument::default(),
            path: None,
        });
    }
}
