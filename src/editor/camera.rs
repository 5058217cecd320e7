use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use crate::map::{SharedDocument, map_to_world};

#[derive(Component)]
pub struct EditorCamera;

#[derive(Component)]
pub struct CameraZoom {
    pub scale: f32,
}

impl Default for CameraZoom {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Camera translation that puts the canvas centre in the middle of the view
fn canvas_focus(document: &SharedDocument) -> Vec3 {
    map_to_world(document.canvas_size().as_vec2() / 2.0).extend(1000.0)
}

pub fn spawn_camera(mut commands: Commands, document: Res<SharedDocument>) {
    commands.spawn((
        Camera2d,
        EditorCamera,
        CameraZoom { scale: 2.0 },
        Transform::from_translation(canvas_focus(&document)),
    ));
}

/// Re-centre on the canvas after a map change
pub fn focus_camera_on_map(
    document: Res<SharedDocument>,
    mut camera_query: Query<&mut Transform, With<EditorCamera>>,
) {
    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = canvas_focus(&document);
    }
}

pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut camera_query: Query<(&mut Transform, &CameraZoom), With<EditorCamera>>,
) {
    if !mouse_button.pressed(MouseButton::Middle) {
        mouse_motion.clear();
        return;
    }

    let Ok((mut transform, zoom)) = camera_query.single_mut() else {
        return;
    };

    for event in mouse_motion.read() {
        let delta = event.delta * zoom.scale;
        transform.translation.x -= delta.x;
        transform.translation.y += delta.y;
    }
}

pub fn camera_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    mut camera_query: Query<&mut CameraZoom, With<EditorCamera>>,
) {
    let Ok(mut zoom) = camera_query.single_mut() else {
        return;
    };

    for event in scroll_events.read() {
        zoom.scale = zoomed_scale(zoom.scale, event.unit, event.y);
    }
}

fn zoomed_scale(scale: f32, unit: MouseScrollUnit, amount: f32) -> f32 {
    let step = match unit {
        MouseScrollUnit::Line => amount * 0.1,
        MouseScrollUnit::Pixel => amount * 0.001,
    };
    (scale - step).clamp(0.1, 10.0)
}

pub fn apply_camera_zoom(
    mut camera_query: Query<(&CameraZoom, &mut Projection), (With<EditorCamera>, Changed<CameraZoom>)>,
) {
    for (zoom, mut projection) in camera_query.iter_mut() {
        if let Projection::Orthographic(ref mut ortho) = *projection {
            ortho.scale = zoom.scale;
        }
    }
}
