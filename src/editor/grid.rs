use bevy::prelude::*;

use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::map::{SharedDocument, map_to_world};
use crate::theme;

use super::camera::CameraZoom;
use super::EditorCamera;

#[derive(Resource)]
pub struct GridSettings {
    pub visible: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { visible: true }
    }
}

/// Flat background sprite covering the map canvas
#[derive(Component)]
pub struct CanvasBackground;

/// Visible range of grid lines along one axis, clipped to `[0, extent]`
fn visible_lines(view_min: f32, view_max: f32, grid_size: f32, extent: f32) -> (i32, i32) {
    let last = (extent / grid_size).floor() as i32;
    let start = ((view_min / grid_size).floor() as i32).max(0);
    let end = ((view_max / grid_size).ceil() as i32).min(last);
    (start, end)
}

pub fn spawn_canvas_background(mut commands: Commands) {
    commands.spawn((
        CanvasBackground,
        Sprite::from_color(theme::CANVAS_BACKGROUND, Vec2::ONE),
        Transform::default(),
    ));
}

/// Resize the canvas background to the open document
pub fn sync_canvas_background(
    document: Res<SharedDocument>,
    mut query: Query<(&mut Sprite, &mut Transform), With<CanvasBackground>>,
) {
    let size = document.canvas_size().as_vec2();
    for (mut sprite, mut transform) in query.iter_mut() {
        if sprite.custom_size != Some(size) {
            sprite.custom_size = Some(size);
            transform.translation = map_to_world(size / 2.0).extend(0.0);
        }
    }
}

pub fn draw_grid(
    mut gizmos: Gizmos,
    settings: Res<GridSettings>,
    document: Res<SharedDocument>,
    camera_query: Query<(&Transform, &CameraZoom), With<EditorCamera>>,
) {
    let canvas = document.canvas_size().as_vec2();
    gizmos.rect_2d(
        Isometry2d::from_translation(map_to_world(canvas / 2.0)),
        canvas,
        theme::CANVAS_BORDER,
    );

    if !settings.visible {
        return;
    }

    let Ok((camera_transform, zoom)) = camera_query.single() else {
        return;
    };

    let grid_size = document.grid().size;
    if grid_size <= 0.0 {
        return;
    }

    // Camera position in map coordinates (y down)
    let camera_pos = camera_transform.translation.truncate() * Vec2::new(1.0, -1.0);
    let half_view = Vec2::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT) * zoom.scale / 2.0;

    let (start_x, end_x) = visible_lines(
        camera_pos.x - half_view.x,
        camera_pos.x + half_view.x,
        grid_size,
        canvas.x,
    );
    let (start_y, end_y) = visible_lines(
        camera_pos.y - half_view.y,
        camera_pos.y + half_view.y,
        grid_size,
        canvas.y,
    );

    let top = start_y as f32 * grid_size;
    let bottom = (end_y as f32 * grid_size).min(canvas.y);
    for x in start_x..=end_x {
        let x_pos = x as f32 * grid_size;
        gizmos.line_2d(
            map_to_world(Vec2::new(x_pos, top)),
            map_to_world(Vec2::new(x_pos, bottom)),
            theme::GRID_COLOR,
        );
    }

    let left = start_x as f32 * grid_size;
    let right = (end_x as f32 * grid_size).min(canvas.x);
    for y in start_y..=end_y {
        let y_pos = y as f32 * grid_size;
        gizmos.line_2d(
            map_to_world(Vec2::new(left, y_pos)),
            map_to_world(Vec2::new(right, y_pos)),
            theme::GRID_COLOR,
        );
    }
}
