//! Fog controls side panel.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;
use std::path::PathBuf;

use crate::config::{AppConfig, SetViewerRoleRequest};
use crate::fog::{FogLayer, FogSettings, ViewerRole};
use crate::theme;

/// Largest reveal radius offered by the slider, in grid units
const MAX_REVEAL_RADIUS: f32 = 120.0;

#[derive(Resource, Default)]
pub struct FogPanelState {
    pub show_reset_confirmation: bool,
    /// Pending async file dialog for the background image
    pub pending_browse: Option<Task<Option<PathBuf>>>,
}

/// Actions requested from inside the panel closure
#[derive(Default)]
struct PanelActions {
    settings: Option<FogSettings>,
    editing: Option<bool>,
    role: Option<ViewerRole>,
    browse: bool,
    reset: bool,
}

pub fn fog_panel_ui(
    mut contexts: EguiContexts,
    mut panel: ResMut<FogPanelState>,
    mut layer: ResMut<FogLayer>,
    config: Res<AppConfig>,
    mut role_events: MessageWriter<SetViewerRoleRequest>,
) -> Result {
    // Poll pending browse task (before drawing so the new path shows this frame)
    if let Some(ref mut task) = panel.pending_browse
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        panel.pending_browse = None;
        if let Some(path) = result {
            let mut settings = layer.settings();
            settings.image = Some(path.to_string_lossy().to_string());
            layer.set_settings(&settings);
        }
    }

    let original = layer.settings();
    let mut settings = original.clone();
    let mut editing = layer.editing();
    let mut role = config.data.viewer_role;
    let mut actions = PanelActions::default();
    let revealed = layer.store().len();
    let layer_enabled = layer.enabled();

    egui::SidePanel::right("fog_panel")
        .default_width(240.0)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Fog Exploration").size(14.0).strong());
                let status = if revealed == 0 {
                    "fully fogged".to_string()
                } else {
                    format!("{} revealed", revealed)
                };
                ui.label(egui::RichText::new(status).size(12.0).weak());
            });
            ui.add_space(4.0);

            ui.checkbox(&mut settings.enabled, "Enable Fog")
                .on_hover_text("Show the fog overlay on this map");

            if ui
                .add_enabled(
                    layer_enabled,
                    egui::Checkbox::new(&mut editing, "Edit Explored Areas (F)"),
                )
                .on_hover_text("Click or drag over cells to reveal or hide them")
                .changed()
            {
                actions.editing = Some(editing);
            }

            ui.add_space(8.0);
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Color");
                let mut color = theme::bevy_to_egui(settings.color);
                if ui.color_edit_button_srgba(&mut color).changed() {
                    settings.color = theme::egui_to_bevy(color);
                }
            });

            ui.add(egui::Slider::new(&mut settings.opacity_gm, 0.0..=1.0).text("GM opacity"));
            ui.add(
                egui::Slider::new(&mut settings.opacity_player, 0.0..=1.0).text("Player opacity"),
            );
            ui.add(
                egui::Slider::new(&mut settings.reveal_radius, 0.0..=MAX_REVEAL_RADIUS)
                    .text("Token vision"),
            )
            .on_hover_text("Radius revealed around observer tokens, in grid units (0 = off)");

            ui.checkbox(&mut settings.persist_explored_areas, "Persist explored areas")
                .on_hover_text("Keep revealed cells when the map is closed");

            ui.add_space(8.0);
            ui.separator();

            ui.label(egui::RichText::new("Background Image").strong());
            let image_label = settings
                .image
                .as_deref()
                .and_then(|p| std::path::Path::new(p).file_name())
                .map(|n| n.to_string_lossy().to_string());
            match image_label {
                Some(name) => ui.label(name),
                None => ui.label(egui::RichText::new("None").weak().italics()),
            };
            ui.horizontal(|ui| {
                if ui.button("Browse...").clicked() {
                    actions.browse = true;
                }
                if ui
                    .add_enabled(settings.image.is_some(), egui::Button::new("Clear"))
                    .clicked()
                {
                    settings.image = None;
                }
            });

            ui.add_space(8.0);
            ui.separator();

            ui.label(egui::RichText::new("Viewer").strong());
            ui.horizontal(|ui| {
                for option in [ViewerRole::Gm, ViewerRole::Player] {
                    if ui
                        .radio_value(&mut role, option, option.display_name())
                        .changed()
                    {
                        actions.role = Some(role);
                    }
                }
            });

            ui.add_space(8.0);
            if ui
                .add_enabled(
                    revealed > 0,
                    egui::Button::new("Reset Fog").min_size(egui::vec2(160.0, 24.0)),
                )
                .on_hover_text("Hide all revealed areas (cover everything with fog)")
                .clicked()
            {
                panel.show_reset_confirmation = true;
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new("T: place token  Shift+T: remove")
                        .small()
                        .color(theme::ui::HINT_TEXT),
                );
            });
        });

    if panel.show_reset_confirmation {
        egui::Window::new("Reset Fog")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                ui.label("Hide every explored area on this map?");
                ui.horizontal(|ui| {
                    if ui.button("Reset").clicked() {
                        actions.reset = true;
                        panel.show_reset_confirmation = false;
                    }
                    if ui.button("Cancel").clicked() {
                        panel.show_reset_confirmation = false;
                    }
                });
            });
    }

    if settings != original {
        actions.settings = Some(settings);
    }

    if let Some(settings) = actions.settings {
        layer.set_settings(&settings);
    }
    if let Some(editing) = actions.editing {
        layer.set_editing(editing);
    }
    if let Some(role) = actions.role {
        role_events.write(SetViewerRoleRequest { role });
    }
    if actions.reset {
        layer.clear();
        info!("Fog reset");
    }
    if actions.browse && panel.pending_browse.is_none() {
        let task_pool = AsyncComputeTaskPool::get();
        panel.pending_browse = Some(task_pool.spawn(async {
            rfd::AsyncFileDialog::new()
                .set_title("Select Fog Image")
                .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp"])
                .pick_file()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }

    Ok(())
}
