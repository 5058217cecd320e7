//! Fog-of-war exploration layer.
//!
//! Cells the user reveals are persisted in the map document; observer tokens
//! additionally reveal a radius around themselves without persisting
//! anything. Everything else is covered by a tinted overlay.
//!
//! ## Module Structure
//!
//! - [`store`] - Persisted set of revealed cell centres
//! - [`mask`] - Visibility mask rebuilt from cells and tokens
//! - [`overlay`] - Tinted overlay and background image
//! - [`editing`] - Click and drag reveal/hide editing
//! - [`layer`] - The layer facade and its lifecycle
//! - [`settings`] - Per-map options stored in the document
//! - [`systems`] - Bevy systems driving the layer

pub mod editing;
pub mod image_load;
pub mod layer;
pub mod mask;
pub mod overlay;
pub mod settings;
pub mod store;
mod systems;
pub mod tokens;

pub use layer::{FogLayer, LayerLifecycle};
pub use settings::{FogSettings, ViewerRole};
pub use tokens::ObserverToken;

use bevy::prelude::*;

use crate::config::ConfigLoaded;
use crate::editor::conditions::no_dialog_open;
use crate::map::{MapLoaded, MapSystems};

/// Ordering of the per-frame fog systems
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FogSystems {
    /// Pointer and keyboard input
    Input,
    /// Token sync, image polling and uploads
    Sync,
}

/// Route mouse and keyboard input into the layer's editing controller
pub fn register_pointer_listeners(app: &mut App) {
    app.add_systems(
        Update,
        (
            systems::end_fog_stroke,
            (
                systems::handle_fog_shortcuts,
                systems::handle_fog_pointer,
                systems::handle_token_placement,
            )
                .chain()
                .run_if(no_dialog_open),
        )
            .chain()
            .in_set(FogSystems::Input),
    );
}

pub struct FogPlugin;

impl Plugin for FogPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (FogSystems::Input, FogSystems::Sync)
                .chain()
                .after(MapSystems::Apply),
        )
        .add_systems(Startup, systems::setup_fog_layer.after(ConfigLoaded))
        .add_systems(
            Update,
            systems::teardown_before_map_change
                .run_if(on_message::<MapLoaded>)
                .after(MapSystems::Io)
                .before(MapSystems::Apply),
        )
        .add_systems(
            Update,
            (
                systems::redraw_after_map_change.run_if(on_message::<MapLoaded>),
                systems::apply_viewer_role,
            )
                .chain()
                .after(MapSystems::Apply)
                .before(FogSystems::Input),
        )
        .add_systems(
            Update,
            (
                systems::sync_observer_tokens,
                systems::poll_fog_images,
                systems::upload_fog_overlay,
                systems::sync_fog_highlights,
            )
                .chain()
                .in_set(FogSystems::Sync),
        )
        .add_systems(
            Update,
            (systems::draw_highlight_borders, systems::draw_tokens).after(FogSystems::Sync),
        );

        register_pointer_listeners(app);
    }
}
