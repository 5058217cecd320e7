mod document;
mod grid;
pub mod persistence;

pub use document::{DocumentStore, MapDocument, SharedDocument};
pub use grid::{CellPolygon, GridGeometry, SquareGrid, map_to_world, world_to_map};
pub use persistence::{
    AsyncMapOperation, CurrentMapFile, LoadMapRequest, MapDirtyState, MapLoadError, MapLoaded,
    MapSaveError, MapSystems, NewMapRequest, SaveMapRequest,
};

use bevy::prelude::*;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SharedDocument>()
            .init_resource::<MapLoadError>()
            .init_resource::<MapSaveError>()
            .init_resource::<CurrentMapFile>()
            .init_resource::<MapDirtyState>()
            .init_resource::<AsyncMapOperation>()
            .add_message::<SaveMapRequest>()
            .add_message::<LoadMapRequest>()
            .add_message::<NewMapRequest>()
            .add_message::<MapLoaded>()
            .configure_sets(Update, (MapSystems::Io, MapSystems::Apply).chain())
            .add_systems(Startup, persistence::ensure_maps_directory)
            .add_systems(
                Update,
                (
                    persistence::save_map_system.run_if(on_message::<SaveMapRequest>),
                    persistence::load_map_system.run_if(on_message::<LoadMapRequest>),
                    persistence::new_map_system.run_if(on_message::<NewMapRequest>),
                    persistence::poll_save_tasks,
                    persistence::poll_load_tasks,
                )
                    .in_set(MapSystems::Io),
            )
            .add_systems(
                Update,
                persistence::apply_loaded_map
                    .run_if(on_message::<MapLoaded>)
                    .in_set(MapSystems::Apply),
            );
    }
}
