//! Per-user app settings (last opened map, viewer role) kept in a JSON file
//! under the platform config directory.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FogError, Result};
use crate::fog::ViewerRole;

/// Startup systems that need the loaded config run after this set
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfigData {
    /// Remembered for the "map not found" warning; never auto-opened
    #[serde(default)]
    pub last_map_path: Option<PathBuf>,

    #[serde(default)]
    pub viewer_role: ViewerRole,
}

#[derive(Resource)]
pub struct AppConfig {
    pub data: AppConfigData,
    pub config_path: PathBuf,
    /// Set when `data` differs from what is on disk
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

impl AppConfig {
    pub fn forget_last_map(&mut self) {
        if self.data.last_map_path.take().is_some() {
            self.dirty = true;
        }
    }
}

#[derive(Resource, Default)]
pub struct MissingMapWarning {
    pub show: bool,
    pub path: Option<PathBuf>,
}

/// Shown once when an unreadable config file was replaced by defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    pub show: bool,
    pub reason: Option<String>,
}

#[derive(Message)]
pub struct SaveConfigRequest;

#[derive(Message)]
pub struct SetViewerRoleRequest {
    pub role: ViewerRole,
}

#[derive(Message)]
pub struct UpdateLastMapPathRequest {
    pub path: PathBuf,
}

/// Read the config file; `Ok(None)` when there is none yet
fn read_config(path: &Path) -> Result<Option<AppConfigData>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path).map_err(|source| FogError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|source| FogError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
}

fn write_config(path: &Path, data: &AppConfigData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).map_err(|source| FogError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    config.dirty = false;
    match read_config(&config.config_path) {
        Ok(Some(data)) => {
            info!("Loaded config from {:?}", config.config_path);
            config.data = data;
        }
        Ok(None) => {
            info!("No config file at {:?}, using defaults", config.config_path);
            config.data = AppConfigData::default();
        }
        Err(e) => {
            warn!("{}", e);
            config.data = AppConfigData::default();
            reset_notification.show = true;
            reset_notification.reason = Some(e.to_string());
        }
    }
}

fn check_last_map_exists(config: Res<AppConfig>, mut warning: ResMut<MissingMapWarning>) {
    if let Some(path) = &config.data.last_map_path
        && !path.exists()
    {
        info!("Last opened map is gone: {:?}", path);
        warning.show = true;
        warning.path = Some(path.clone());
    }
}

fn save_config_system(mut events: MessageReader<SaveConfigRequest>, mut config: ResMut<AppConfig>) {
    // Several requests in one frame collapse into a single write
    events.clear();
    if !config.dirty {
        return;
    }
    match write_config(&config.config_path, &config.data) {
        Ok(()) => debug!("Saved config to {:?}", config.config_path),
        Err(e) => error!("{}", e),
    }
    config.dirty = false;
}

fn set_viewer_role_system(
    mut events: MessageReader<SetViewerRoleRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    let Some(role) = events.read().last().map(|e| e.role) else {
        return;
    };
    if config.data.viewer_role != role {
        config.data.viewer_role = role;
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        info!("Viewing fog as {}", role.display_name());
    }
}

fn update_last_map_path_system(
    mut events: MessageReader<UpdateLastMapPathRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    let Some(path) = events.read().last().map(|e| e.path.clone()) else {
        return;
    };
    if config.data.last_map_path.as_ref() != Some(&path) {
        config.data.last_map_path = Some(path);
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<MissingMapWarning>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<SetViewerRoleRequest>()
            .add_message::<UpdateLastMapPathRequest>()
            .add_systems(
                Startup,
                (load_config_system, check_last_map_exists)
                    .chain()
                    .in_set(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    (
                        set_viewer_role_system.run_if(on_message::<SetViewerRoleRequest>),
                        update_last_map_path_system
                            .run_if(on_message::<UpdateLastMapPathRequest>),
                    ),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}
