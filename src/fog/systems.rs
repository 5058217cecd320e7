//! Bevy systems connecting the fog layer to the running app.
//!
//! These translate host input into layer operations, keep the token snapshot
//! current, and upload the composed overlay to a sprite. All positions handed
//! to the layer are map coordinates (y down).

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy_egui::EguiContexts;

use crate::config::AppConfig;
use crate::constants::{FOG_OVERLAY_Z, TOKEN_Z};
use crate::editor::params::{CameraParams, is_cursor_over_ui};
use crate::map::{SharedDocument, map_to_world, world_to_map};
use crate::theme;

use super::editing::{HighlightCell, PointerButton, PointerEvent};
use super::image_load::FileImageLoader;
use super::layer::{FogLayer, LayerLifecycle};
use super::tokens::{ObserverToken, PlacedToken};

/// Sprite showing the composed overlay
#[derive(Component, Default)]
pub struct FogOverlay {
    /// Frame revision of the uploaded texture
    uploaded: Option<(u64, u64)>,
}

/// Fill sprite for a highlighted cell
#[derive(Component)]
pub struct FogHighlight;

pub fn setup_fog_layer(mut commands: Commands, document: Res<SharedDocument>, config: Res<AppConfig>) {
    let mut layer = FogLayer::new(
        Box::new(document.clone()),
        Box::new(document.grid()),
        Box::new(FileImageLoader),
        document.canvas_size(),
    );
    layer.draw();
    layer.set_viewer_role(config.data.viewer_role);
    commands.insert_resource(layer);

    commands.spawn((
        FogOverlay::default(),
        Sprite::default(),
        Transform::from_xyz(0.0, 0.0, FOG_OVERLAY_Z),
        Visibility::Hidden,
    ));
}

// ============================================================================
// Map lifecycle
// ============================================================================

/// Release the old document before it is replaced
pub fn teardown_before_map_change(mut layer: ResMut<FogLayer>) {
    layer.teardown();
}

/// Redraw against the newly loaded document
pub fn redraw_after_map_change(
    mut commands: Commands,
    mut layer: ResMut<FogLayer>,
    document: Res<SharedDocument>,
    tokens: Query<Entity, With<ObserverToken>>,
) {
    for entity in tokens.iter() {
        commands.entity(entity).despawn();
    }
    layer.sync_tokens(&Vec::new());
    layer.set_grid(Box::new(document.grid()));
    layer.set_canvas(document.canvas_size());
    layer.draw();
}

pub fn apply_viewer_role(config: Res<AppConfig>, mut layer: ResMut<FogLayer>) {
    if config.is_changed() {
        layer.set_viewer_role(config.data.viewer_role);
    }
}

// ============================================================================
// Input
// ============================================================================

/// Toggle editing with F
pub fn handle_fog_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut layer: ResMut<FogLayer>,
    mut contexts: EguiContexts,
) {
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }

    if keyboard.just_pressed(KeyCode::KeyF) && layer.enabled() {
        let editing = !layer.editing();
        layer.set_editing(editing);
    }
}

/// End the current stroke on primary release. Runs even while a dialog is
/// open so a release under a modal cannot leave the stroke painting.
pub fn end_fog_stroke(mouse: Res<ButtonInput<MouseButton>>, mut layer: ResMut<FogLayer>) {
    if mouse.just_released(MouseButton::Left) {
        layer.handle_pointer(PointerEvent::Release {
            button: PointerButton::Primary,
        });
    }
}

/// Forward mouse presses and moves to the editing controller
pub fn handle_fog_pointer(
    mouse: Res<ButtonInput<MouseButton>>,
    camera: CameraParams,
    mut contexts: EguiContexts,
    mut layer: ResMut<FogLayer>,
    mut last_position: Local<Option<Vec2>>,
) {
    if is_cursor_over_ui(&mut contexts) {
        return;
    }
    let Some(world_pos) = camera.cursor_world_pos() else {
        return;
    };
    let position = world_to_map(world_pos);

    for (mouse_button, button) in [
        (MouseButton::Left, PointerButton::Primary),
        (MouseButton::Right, PointerButton::Secondary),
        (MouseButton::Middle, PointerButton::Middle),
    ] {
        if mouse.just_pressed(mouse_button) {
            layer.handle_pointer(PointerEvent::Press { position, button });
        }
    }

    if *last_position != Some(position) {
        *last_position = Some(position);
        layer.handle_pointer(PointerEvent::Move {
            position,
            primary_held: mouse.pressed(MouseButton::Left),
        });
    }
}

/// T places an observer token on the cursor cell, Shift+T removes the token
/// under the cursor.
pub fn handle_token_placement(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    camera: CameraParams,
    mut contexts: EguiContexts,
    layer: Res<FogLayer>,
    tokens: Query<(Entity, &ObserverToken, &Transform)>,
) {
    if !keyboard.just_pressed(KeyCode::KeyT) || is_cursor_over_ui(&mut contexts) {
        return;
    }
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }
    let Some(world_pos) = camera.cursor_world_pos() else {
        return;
    };

    let shift = keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);
    if shift {
        let hit = tokens.iter().find(|(_, token, transform)| {
            transform.translation.truncate().distance(world_pos) <= token.width / 2.0
        });
        if let Some((entity, _, _)) = hit {
            commands.entity(entity).despawn();
            info!("Removed observer token");
        }
        return;
    }

    let center = layer.grid().center_of(world_to_map(world_pos));
    let world_center = map_to_world(center);
    commands.spawn((
        ObserverToken {
            width: layer.grid().cell_size(),
            observer: true,
        },
        Transform::from_xyz(world_center.x, world_center.y, TOKEN_Z),
    ));
    info!("Placed observer token at ({:.0}, {:.0})", center.x, center.y);
}

// ============================================================================
// Per-frame sync
// ============================================================================

pub fn sync_observer_tokens(
    mut layer: ResMut<FogLayer>,
    tokens: Query<(&ObserverToken, &Transform)>,
) {
    let snapshot: Vec<PlacedToken> = tokens
        .iter()
        .map(|(token, transform)| PlacedToken {
            center: world_to_map(transform.translation.truncate()),
            width: token.width,
            observer: token.observer,
        })
        .collect();
    layer.sync_tokens(&snapshot);
}

pub fn poll_fog_images(mut layer: ResMut<FogLayer>) {
    layer.poll_image_loads();
}

/// Keep the overlay sprite in step with the layer. A new overlay base
/// uploads a fresh texture; a mask-only change rewrites the alpha bytes of
/// the existing one.
pub fn upload_fog_overlay(
    layer: Res<FogLayer>,
    mut images: ResMut<Assets<Image>>,
    mut query: Query<(&mut FogOverlay, &mut Sprite, &mut Transform, &mut Visibility)>,
) {
    let Ok((mut overlay, mut sprite, mut transform, mut visibility)) = query.single_mut() else {
        return;
    };

    let target = if layer.enabled() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    if *visibility != target {
        *visibility = target;
    }
    let color = layer.overlay_color();
    if sprite.color != color {
        sprite.color = color;
    }

    let revision = layer.frame_revision();
    let needs_full = match overlay.uploaded {
        None => true,
        Some(uploaded) if uploaded == revision => return,
        Some((_, base_revision)) => base_revision != revision.1,
    };

    let refreshed = !needs_full
        && match images.get_mut(&sprite.image) {
            Some(mut image) => match image.data.as_mut() {
                Some(data) => {
                    layer.write_mask_alpha(data);
                    true
                }
                None => false,
            },
            None => false,
        };

    if refreshed {
        overlay.uploaded = Some(revision);
    } else {
        upload_full_frame(&layer, &mut images, &mut overlay, &mut sprite, &mut transform);
    }
}

fn upload_full_frame(
    layer: &FogLayer,
    images: &mut Assets<Image>,
    overlay: &mut FogOverlay,
    sprite: &mut Sprite,
    transform: &mut Transform,
) {
    let frame = layer.compose_frame();
    let (width, height) = frame.dimensions();
    let image = Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        frame.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    );

    let previous = std::mem::replace(&mut sprite.image, images.add(image));
    // The first upload replaces bevy's shared default texture
    if overlay.uploaded.is_some() {
        images.remove(&previous);
    }

    let size = Vec2::new(width as f32, height as f32);
    sprite.custom_size = Some(size);
    transform.translation = map_to_world(size / 2.0).extend(FOG_OVERLAY_Z);
    overlay.uploaded = Some(layer.frame_revision());
}

/// Mirror the layer's highlight cells as fill sprites
pub fn sync_fog_highlights(
    mut commands: Commands,
    layer: Res<FogLayer>,
    existing: Query<Entity, With<FogHighlight>>,
    mut shown: Local<Vec<HighlightCell>>,
) {
    let cells: Vec<HighlightCell> = layer.highlights().iter().copied().collect();
    if cells == *shown {
        return;
    }

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    let size = layer.grid().cell_size();
    for cell in &cells {
        let center = map_to_world(Vec2::new(cell.x, cell.y) + Vec2::splat(size / 2.0));
        commands.spawn((
            FogHighlight,
            Sprite::from_color(cell.color, Vec2::splat(size)),
            Transform::from_translation(center.extend(FOG_OVERLAY_Z + 1.0)),
        ));
    }
    *shown = cells;
}

pub fn draw_highlight_borders(mut gizmos: Gizmos, layer: Res<FogLayer>) {
    let size = layer.grid().cell_size();
    for cell in layer.highlights().iter() {
        let center = map_to_world(Vec2::new(cell.x, cell.y) + Vec2::splat(size / 2.0));
        gizmos.rect_2d(
            Isometry2d::from_translation(center),
            Vec2::splat(size),
            cell.border,
        );
    }
}

pub fn draw_tokens(
    mut gizmos: Gizmos,
    layer: Res<FogLayer>,
    tokens: Query<(&ObserverToken, &Transform)>,
) {
    let reveal_radius = layer.settings().reveal_radius;
    for (token, transform) in tokens.iter() {
        let center = transform.translation.truncate();
        let color = if token.observer {
            theme::TOKEN_OBSERVER
        } else {
            theme::TOKEN_PLAIN
        };
        gizmos.circle_2d(Isometry2d::from_translation(center), token.width / 2.0, color);

        if token.observer && reveal_radius > 0.0 {
            let placed = PlacedToken::observer(world_to_map(center), token.width);
            gizmos.circle_2d(
                Isometry2d::from_translation(center),
                placed.light_radius(reveal_radius, layer.grid()),
                theme::TOKEN_LIGHT_RING,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    use crate::fog::image_load::test_support::ManualLoader;
    use crate::map::{MapDocument, SquareGrid};

    fn editing_layer() -> FogLayer {
        let mut layer = FogLayer::new(
            Box::new(SharedDocument::new(MapDocument::default())),
            Box::new(SquareGrid::new(50.0)),
            Box::new(ManualLoader::default()),
            UVec2::new(600, 600),
        );
        layer.draw();
        layer.set_editing(true);
        layer
    }

    #[test]
    fn test_release_ends_stroke_without_pointer_systems() {
        let mut layer = editing_layer();
        layer.handle_pointer(PointerEvent::Press {
            position: Vec2::new(10.0, 10.0),
            button: PointerButton::Primary,
        });
        assert_eq!(layer.store().len(), 1);

        let mut mouse = ButtonInput::<MouseButton>::default();
        mouse.press(MouseButton::Left);
        mouse.release(MouseButton::Left);

        let mut world = World::new();
        world.insert_resource(mouse);
        world.insert_resource(layer);
        world.run_system_once(end_fog_stroke).unwrap();

        // A later held move must not keep painting
        let mut layer = world.resource_mut::<FogLayer>();
        layer.handle_pointer(PointerEvent::Move {
            position: Vec2::new(110.0, 10.0),
            primary_held: true,
        });
        assert_eq!(layer.store().len(), 1);
    }

    #[test]
    fn test_no_release_keeps_stroke_painting() {
        let mut layer = editing_layer();
        layer.handle_pointer(PointerEvent::Press {
            position: Vec2::new(10.0, 10.0),
            button: PointerButton::Primary,
        });

        let mut world = World::new();
        world.insert_resource(ButtonInput::<MouseButton>::default());
        world.insert_resource(layer);
        world.run_system_once(end_fog_stroke).unwrap();

        let mut layer = world.resource_mut::<FogLayer>();
        layer.handle_pointer(PointerEvent::Move {
            position: Vec2::new(110.0, 10.0),
            primary_held: true,
        });
        assert_eq!(layer.store().len(), 2);
    }
}
