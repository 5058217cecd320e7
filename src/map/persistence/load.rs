//! Map load system, task polling and document replacement.

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;

use crate::config::UpdateLastMapPathRequest;
use crate::map::SharedDocument;

use super::io::read_document;
use super::messages::{LoadMapRequest, MapLoaded};
use super::resources::{AsyncMapOperation, CurrentMapFile, LoadMapTask, MapDirtyState, MapLoadError};
use super::results::LoadResult;

/// Starts an async load operation
pub fn load_map_system(
    mut commands: Commands,
    mut events: MessageReader<LoadMapRequest>,
    mut async_op: ResMut<AsyncMapOperation>,
) {
    for event in events.read() {
        if async_op.is_busy() {
            warn!("Load operation already in progress");
            continue;
        }

        let path = event.path.clone();
        let map_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("map")
            .to_string();

        async_op.is_loading = true;
        async_op.operation_description = Some(format!("Loading {}...", map_name));

        let task = IoTaskPool::get().spawn(async move {
            let outcome = read_document(&path);
            LoadResult { path, outcome }
        });

        commands.spawn(LoadMapTask(task));
    }
}

/// Polls load tasks; a parsed document is handed on as [`MapLoaded`]
pub fn poll_load_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadMapTask)>,
    mut async_op: ResMut<AsyncMapOperation>,
    mut load_error: ResMut<MapLoadError>,
    mut loaded_events: MessageWriter<MapLoaded>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };

        async_op.is_loading = false;
        async_op.operation_description = None;
        load_error.message = None;

        match result.outcome {
            Ok(document) => {
                info!("Loaded map '{}' from {:?}", document.name, result.path);
                loaded_events.write(MapLoaded {
                    document,
                    path: Some(result.path),
                });
            }
            Err(e) => {
                error!("{}", e);
                load_error.message = Some(e.to_string());
            }
        }

        commands.entity(entity).despawn();
    }
}

/// Replace the open document with a loaded one
pub fn apply_loaded_map(
    mut events: MessageReader<MapLoaded>,
    document: Res<SharedDocument>,
    mut dirty_state: ResMut<MapDirtyState>,
    mut current_map_file: ResMut<CurrentMapFile>,
    mut config_events: MessageWriter<UpdateLastMapPathRequest>,
) {
    for event in events.read() {
        document.replace(event.document.clone());
        dirty_state.mark_clean(document.revision());

        if let Some(path) = &event.path {
            config_events.write(UpdateLastMapPathRequest { path: path.clone() });
        }
        current_map_file.path = event.path.clone();
    }
}
