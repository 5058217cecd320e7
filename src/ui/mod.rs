pub mod file_menu;
mod fog_panel;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::{ConfigResetNotification, MissingMapWarning};
use crate::map::{AsyncMapOperation, MapLoadError, MapSaveError};

/// Resource that tracks whether any modal dialog is currently open.
/// Editor input handlers should check this to avoid processing input
/// when the user is interacting with a dialog.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block editor input
    pub any_modal_open: bool,
}

/// Aggregate all dialog open states into [`DialogState`].
/// Runs in First schedule before input handlers.
#[allow(clippy::too_many_arguments)]
fn update_dialog_state(
    file_menu: Res<file_menu::FileMenuState>,
    fog_panel: Res<fog_panel::FogPanelState>,
    missing_map: Res<MissingMapWarning>,
    config_reset: Res<ConfigResetNotification>,
    save_error: Res<MapSaveError>,
    load_error: Res<MapLoadError>,
    async_op: Res<AsyncMapOperation>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = file_menu.show_new_confirmation
        || file_menu.any_file_dialog_pending()
        || fog_panel.show_reset_confirmation
        || fog_panel.pending_browse.is_some()
        || missing_map.show
        || config_reset.show
        || save_error.message.is_some()
        || load_error.message.is_some()
        || async_op.is_busy();
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .init_resource::<file_menu::FileMenuState>()
            .init_resource::<fog_panel::FogPanelState>()
            .add_systems(First, update_dialog_state)
            // Top panel first so the side panel fits below it
            .add_systems(
                EguiPrimaryContextPass,
                (file_menu::file_menu_ui, fog_panel::fog_panel_ui).chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    file_menu::map_error_dialogs_ui,
                    file_menu::async_operation_modal_ui,
                    file_menu::missing_map_warning_ui,
                    file_menu::config_reset_notification_ui,
                )
                    .after(fog_panel::fog_panel_ui),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_state_default_closed() {
        assert!(!DialogState::default().any_modal_open);
    }
}
