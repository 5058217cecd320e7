//! Unit tests for the persistence module.

use serde_json::json;
use std::path::PathBuf;

use bevy::prelude::*;

use crate::error::FogError;
use crate::fog::image_load::test_support::ManualLoader;
use crate::fog::{FogLayer, LayerLifecycle};
use crate::map::{DocumentStore, MapDocument, SharedDocument, SquareGrid};

use super::io::{read_document, save_snapshot, write_document};
use super::resources::{AsyncMapOperation, MapDirtyState};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("fogreveal-{}-{}.json", std::process::id(), name))
}

#[test]
fn test_written_document_reads_back() {
    let path = temp_path("roundtrip");
    let mut document = MapDocument::default();
    document.name = "Goblin Caves".to_string();
    document.set("fog", "revealed", json!([[35.0, 35.0]]));

    write_document(&path, &document).unwrap();
    let loaded = read_document(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.name, "Goblin Caves");
    assert_eq!(loaded.get("fog", "revealed"), Some(json!([[35.0, 35.0]])));
}

#[test]
fn test_missing_file_is_read_error() {
    let result = read_document(&temp_path("does-not-exist"));
    assert!(matches!(result, Err(FogError::DocumentRead { .. })));
}

#[test]
fn test_malformed_file_is_format_error() {
    let path = temp_path("malformed");
    std::fs::write(&path, "{ \"name\": ").unwrap();
    let result = read_document(&path);
    let _ = std::fs::remove_file(&path);

    assert!(matches!(result, Err(FogError::DocumentFormat(_))));
}

#[test]
fn test_write_to_missing_directory_fails() {
    let path = temp_path("no-such-dir").join("map.json");
    let result = write_document(&path, &MapDocument::default());
    assert!(matches!(result, Err(FogError::DocumentWrite { .. })));
}

#[test]
fn test_dirty_state_follows_revisions() {
    let mut document = SharedDocument::default();
    let mut dirty = MapDirtyState::default();
    assert!(!dirty.is_dirty(&document));

    document.set("fog", "enabled", json!(false));
    assert!(dirty.is_dirty(&document));

    dirty.mark_clean(document.revision());
    assert!(!dirty.is_dirty(&document));
}

#[test]
fn test_async_operation_busy() {
    let mut op = AsyncMapOperation::default();
    assert!(!op.is_busy());
    op.is_loading = true;
    assert!(op.is_busy());
}

fn fog_layer(document: SharedDocument) -> FogLayer {
    let mut layer = FogLayer::new(
        Box::new(document),
        Box::new(SquareGrid::new(50.0)),
        Box::new(ManualLoader::default()),
        UVec2::new(600, 600),
    );
    layer.draw();
    layer
}

/// Save the open document, load it back and redraw a fresh layer on it
fn reopen(document: &SharedDocument, name: &str) -> FogLayer {
    let path = temp_path(name);
    let (snapshot, _) = save_snapshot(document);
    write_document(&path, &snapshot).unwrap();
    let loaded = read_document(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    fog_layer(SharedDocument::new(loaded))
}

#[test]
fn test_reopened_map_forgets_cells_when_not_persisting() {
    let document = SharedDocument::default();
    let mut layer = fog_layer(document.clone());
    let mut settings = layer.settings();
    settings.persist_explored_areas = false;
    layer.set_settings(&settings);
    assert!(layer.reveal(Vec2::new(10.0, 10.0)));

    let reopened = reopen(&document, "not-persisting");
    assert!(reopened.store().is_empty());
    assert!(!reopened.is_revealed(Vec2::new(10.0, 10.0)));
    assert!(!reopened.settings().persist_explored_areas);

    // The open map keeps its cells until it is closed
    assert_eq!(layer.store().len(), 1);
}

#[test]
fn test_reopened_map_keeps_cells_when_persisting() {
    let document = SharedDocument::default();
    let mut layer = fog_layer(document.clone());
    layer.reveal(Vec2::new(10.0, 10.0));
    layer.reveal(Vec2::new(110.0, 60.0));

    let reopened = reopen(&document, "persisting");
    assert_eq!(reopened.store().len(), 2);
    assert!(reopened.is_revealed(Vec2::new(120.0, 70.0)));
}
