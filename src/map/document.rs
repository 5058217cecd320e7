//! Map document: canvas dimensions, grid, and namespaced key-value flags.
//!
//! The fog layer keeps everything it persists (revealed cells and settings)
//! as flags under its own namespace. It only ever sees the document through
//! [`DocumentStore`], so tests can hand it a bare [`MapDocument`] while the
//! application shares one [`SharedDocument`] between the map and fog plugins.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::grid::SquareGrid;

/// Key-value persistence keyed by (namespace, key).
pub trait DocumentStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;
    fn set(&mut self, namespace: &str, key: &str, value: Value);
    fn unset(&mut self, namespace: &str, key: &str);
}

/// Persisted map document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDocument {
    pub name: String,
    /// Canvas width in map units
    pub width: u32,
    /// Canvas height in map units
    pub height: u32,
    #[serde(default)]
    pub grid: SquareGrid,
    #[serde(default)]
    pub flags: BTreeMap<String, serde_json::Map<String, Value>>,
}

impl Default for MapDocument {
    fn default() -> Self {
        Self {
            name: "Untitled Map".to_string(),
            width: 2800,
            height: 2100,
            grid: SquareGrid::default(),
            flags: BTreeMap::new(),
        }
    }
}

impl MapDocument {
    pub fn canvas_size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

impl DocumentStore for MapDocument {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.flags.get(namespace)?.get(key).cloned()
    }

    fn set(&mut self, namespace: &str, key: &str, value: Value) {
        self.flags
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn unset(&mut self, namespace: &str, key: &str) {
        if let Some(ns) = self.flags.get_mut(namespace) {
            ns.remove(key);
            if ns.is_empty() {
                self.flags.remove(namespace);
            }
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    document: MapDocument,
    revision: u64,
}

/// Cloneable handle to the open map document.
///
/// Every write bumps a revision counter so the host can detect unsaved
/// changes without diffing.
#[derive(Resource, Debug, Clone, Default)]
pub struct SharedDocument {
    inner: Arc<RwLock<SharedState>>,
}

impl SharedDocument {
    pub fn new(document: MapDocument) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SharedState {
                document,
                revision: 0,
            })),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SharedState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SharedState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Clone of the current document and the revision it was taken at
    pub fn snapshot(&self) -> (MapDocument, u64) {
        let state = self.read_state();
        (state.document.clone(), state.revision)
    }

    /// Replace the whole document (after loading a map)
    pub fn replace(&self, document: MapDocument) {
        let mut state = self.write_state();
        state.document = document;
        state.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.read_state().revision
    }

    pub fn grid(&self) -> SquareGrid {
        self.read_state().document.grid
    }

    pub fn canvas_size(&self) -> UVec2 {
        self.read_state().document.canvas_size()
    }

    pub fn name(&self) -> String {
        self.read_state().document.name.clone()
    }
}

impl DocumentStore for SharedDocument {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.read_state().document.get(namespace, key)
    }

    fn set(&mut self, namespace: &str, key: &str, value: Value) {
        let mut state = self.write_state();
        state.document.set(namespace, key, value);
        state.revision += 1;
    }

    fn unset(&mut self, namespace: &str, key: &str) {
        let mut state = self.write_state();
        state.document.unset(namespace, key);
        state.revision += 1;
    }
}
