use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;
use std::path::PathBuf;

use crate::config::{AppConfig, ConfigResetNotification, MissingMapWarning, SaveConfigRequest};
use crate::constants::MAP_FILE_EXTENSION;
use crate::editor::GridSettings;
use crate::map::{
    AsyncMapOperation, CurrentMapFile, LoadMapRequest, MapDirtyState, MapLoadError, MapSaveError,
    NewMapRequest, SaveMapRequest, SharedDocument,
};
use crate::theme;

#[derive(Resource, Default)]
pub struct FileMenuState {
    pub show_new_confirmation: bool,
    /// Pending async dialog picking a map to open
    pub pending_open: Option<Task<Option<PathBuf>>>,
    /// Pending async dialog picking a save destination
    pub pending_save: Option<Task<Option<PathBuf>>>,
}

impl FileMenuState {
    pub fn any_file_dialog_pending(&self) -> bool {
        self.pending_open.is_some() || self.pending_save.is_some()
    }
}

fn map_file_dialog(title: &str) -> rfd::AsyncFileDialog {
    let mut dialog = rfd::AsyncFileDialog::new()
        .set_title(title)
        .add_filter("Map", &[MAP_FILE_EXTENSION]);
    let maps_dir = crate::paths::maps_dir();
    if maps_dir.exists() {
        dialog = dialog.set_directory(maps_dir);
    }
    dialog
}

fn spawn_open_dialog() -> Task<Option<PathBuf>> {
    AsyncComputeTaskPool::get().spawn(async {
        map_file_dialog("Open Map")
            .pick_file()
            .await
            .map(|h| h.path().to_path_buf())
    })
}

fn spawn_save_dialog(file_name: String) -> Task<Option<PathBuf>> {
    AsyncComputeTaskPool::get().spawn(async move {
        map_file_dialog("Save Map")
            .set_file_name(file_name)
            .save_file()
            .await
            .map(|h| h.path().to_path_buf())
    })
}

fn sanitize_filename(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string();
    if cleaned.is_empty() {
        "map".to_string()
    } else {
        cleaned
    }
}

/// Top bar with file actions and the map title
#[allow(clippy::too_many_arguments)]
pub fn file_menu_ui(
    mut contexts: EguiContexts,
    mut menu_state: ResMut<FileMenuState>,
    mut grid_settings: ResMut<GridSettings>,
    document: Res<SharedDocument>,
    dirty_state: Res<MapDirtyState>,
    current_map_file: Res<CurrentMapFile>,
    mut save_events: MessageWriter<SaveMapRequest>,
    mut load_events: MessageWriter<LoadMapRequest>,
    mut new_events: MessageWriter<NewMapRequest>,
) -> Result {
    // Poll pending dialogs
    if let Some(ref mut task) = menu_state.pending_open
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        menu_state.pending_open = None;
        if let Some(path) = result {
            load_events.write(LoadMapRequest { path });
        }
    }
    if let Some(ref mut task) = menu_state.pending_save
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        menu_state.pending_save = None;
        if let Some(path) = result {
            save_events.write(SaveMapRequest { path });
        }
    }

    let is_dirty = dirty_state.is_dirty(&document);
    let map_name = document.name();
    let mut open_clicked = false;
    let mut save_as_clicked = false;

    egui::TopBottomPanel::top("file_menu")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 6)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                if ui.button("New").clicked() {
                    if is_dirty {
                        menu_state.show_new_confirmation = true;
                    } else {
                        new_events.write(NewMapRequest);
                    }
                }
                if ui.button("Open...").clicked() {
                    open_clicked = true;
                }
                if ui.button("Save").clicked() {
                    match &current_map_file.path {
                        Some(path) => {
                            save_events.write(SaveMapRequest { path: path.clone() });
                        }
                        None => save_as_clicked = true,
                    }
                }
                if ui.button("Save As...").clicked() {
                    save_as_clicked = true;
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);
                ui.checkbox(&mut grid_settings.visible, "Grid");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let title = if is_dirty {
                        format!("{} *", map_name)
                    } else {
                        map_name.clone()
                    };
                    ui.label(egui::RichText::new(title).strong());
                });
            });
        });

    if open_clicked && menu_state.pending_open.is_none() {
        menu_state.pending_open = Some(spawn_open_dialog());
    }
    if save_as_clicked && menu_state.pending_save.is_none() {
        let file_name = format!("{}.{}", sanitize_filename(&map_name), MAP_FILE_EXTENSION);
        menu_state.pending_save = Some(spawn_save_dialog(file_name));
    }

    if menu_state.show_new_confirmation {
        egui::Window::new("New Map")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                ui.label("Create a new map? Unsaved changes will be lost.");
                ui.horizontal(|ui| {
                    if ui.button("Create New").clicked() {
                        new_events.write(NewMapRequest);
                        menu_state.show_new_confirmation = false;
                    }
                    if ui.button("Cancel").clicked() {
                        menu_state.show_new_confirmation = false;
                    }
                });
            });
    }

    Ok(())
}

/// Error dialogs for failed saves and loads
pub fn map_error_dialogs_ui(
    mut contexts: EguiContexts,
    mut save_error: ResMut<MapSaveError>,
    mut load_error: ResMut<MapLoadError>,
) -> Result {
    for (title, slot) in [
        ("Save Error", &mut save_error.message),
        ("Load Error", &mut load_error.message),
    ] {
        let Some(error) = slot.clone() else {
            continue;
        };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                    ui.colored_label(theme::ui::ERROR_TEXT, error);
                });
                if ui.button("OK").clicked() {
                    *slot = None;
                }
            });
    }
    Ok(())
}

/// Modal shown while a save or load is running
pub fn async_operation_modal_ui(
    mut contexts: EguiContexts,
    async_op: Res<AsyncMapOperation>,
) -> Result {
    let Some(description) = &async_op.operation_description else {
        return Ok(());
    };

    egui::Window::new("Please wait")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(description);
            });
        });
    Ok(())
}

/// Renders the missing map warning dialog (shown at startup if last map doesn't exist)
pub fn missing_map_warning_ui(
    mut contexts: EguiContexts,
    mut warning: ResMut<MissingMapWarning>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    if !warning.show {
        return Ok(());
    }

    egui::Window::new("Map Not Found")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The last opened map file no longer exists:");

            if let Some(ref path) = warning.path {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(path.to_string_lossy()).weak());
                ui.add_space(10.0);
            }

            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    warning.show = false;
                }

                if ui.button("Clear from history").clicked() {
                    config.forget_last_map();
                    save_events.write(SaveConfigRequest);
                    warning.show = false;
                }
            });
        });

    Ok(())
}

pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings could not be read and were reset to defaults.");
            if let Some(ref reason) = notification.reason {
                ui.label(egui::RichText::new(reason).weak());
            }
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_replaces_separators() {
        assert_eq!(sanitize_filename("caves/level:1"), "caves_level_1");
    }

    #[test]
    fn test_sanitize_filename_never_empty() {
        assert_eq!(sanitize_filename("   "), "map");
    }

    #[test]
    fn test_file_menu_state_pending() {
        let state = FileMenuState::default();
        assert!(!state.any_file_dialog_pending());
    }
}
