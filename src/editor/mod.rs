mod camera;
pub mod conditions;
mod grid;
pub mod params;

pub use camera::EditorCamera;
pub use grid::GridSettings;

use bevy::prelude::*;

use crate::map::{MapLoaded, MapSystems};

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GridSettings>()
            .add_systems(
                Startup,
                (camera::spawn_camera, grid::spawn_canvas_background),
            )
            .add_systems(
                Update,
                (
                    camera::camera_pan,
                    camera::camera_zoom,
                    camera::apply_camera_zoom,
                    grid::draw_grid,
                    grid::sync_canvas_background,
                ),
            )
            .add_systems(
                Update,
                camera::focus_camera_on_map
                    .run_if(on_message::<MapLoaded>)
                    .after(MapSystems::Apply),
            );
    }
}
