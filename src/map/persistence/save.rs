//! Map save system and task polling.

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;

use crate::config::UpdateLastMapPathRequest;
use crate::map::SharedDocument;

use super::io::{save_snapshot, write_document};
use super::messages::SaveMapRequest;
use super::resources::{AsyncMapOperation, CurrentMapFile, MapDirtyState, MapSaveError, SaveMapTask};
use super::results::SaveResult;

/// Starts an async save operation
pub fn save_map_system(
    mut commands: Commands,
    mut events: MessageReader<SaveMapRequest>,
    document: Res<SharedDocument>,
    mut async_op: ResMut<AsyncMapOperation>,
) {
    for event in events.read() {
        if async_op.is_busy() {
            warn!("Save operation already in progress");
            continue;
        }

        let (snapshot, revision) = save_snapshot(&document);
        let path = event.path.clone();
        let map_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("map")
            .to_string();

        async_op.is_saving = true;
        async_op.operation_description = Some(format!("Saving {}...", map_name));

        let task = IoTaskPool::get().spawn(async move {
            let outcome = write_document(&path, &snapshot);
            SaveResult {
                path,
                revision,
                outcome,
            }
        });

        commands.spawn(SaveMapTask(task));
    }
}

/// Polls save tasks and handles completion
pub fn poll_save_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut SaveMapTask)>,
    mut async_op: ResMut<AsyncMapOperation>,
    mut current_map_file: ResMut<CurrentMapFile>,
    mut config_events: MessageWriter<UpdateLastMapPathRequest>,
    mut dirty_state: ResMut<MapDirtyState>,
    mut save_error: ResMut<MapSaveError>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };

        async_op.is_saving = false;
        async_op.operation_description = None;

        match result.outcome {
            Ok(()) => {
                info!("Map saved to {:?}", result.path);
                save_error.message = None;
                dirty_state.mark_clean(result.revision);
                config_events.write(UpdateLastMapPathRequest {
                    path: result.path.clone(),
                });
                current_map_file.path = Some(result.path);
            }
            Err(e) => {
                error!("{}", e);
                save_error.message = Some(e.to_string());
            }
        }

        commands.entity(entity).despawn();
    }
}
