//! Persisted set of revealed grid cells.
//!
//! Each entry is the rounded centre of a revealed cell. Membership is decided
//! by spatial containment rather than coordinate equality: a point counts as
//! revealed when the polygon of the cell under it contains a stored centre.
//! That keeps reveal idempotent per cell no matter where inside the cell the
//! user clicked, and works the same for any grid variant.
//!
//! Lookups are a linear scan over the entries (O(n) per query).

use bevy::prelude::*;
use serde_json::json;

use crate::constants::{FOG_NAMESPACE, KEY_REVEALED};
use crate::map::{DocumentStore, GridGeometry};

use super::settings::SettingsProvider;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealStore {
    /// Revealed cell centres, in insertion order
    areas: Vec<Vec2>,
}

impl RevealStore {
    /// Load the revealed sequence from the document (missing or malformed = empty)
    pub fn load<S: DocumentStore + ?Sized>(document: &S) -> Self {
        let areas = document
            .get(FOG_NAMESPACE, KEY_REVEALED)
            .and_then(|value| match serde_json::from_value::<Vec<[f32; 2]>>(value) {
                Ok(pairs) => Some(pairs),
                Err(e) => {
                    warn!("Ignoring malformed revealed areas: {}", e);
                    None
                }
            })
            .unwrap_or_default()
            .into_iter()
            .map(Vec2::from)
            .collect();

        Self { areas }
    }

    pub fn areas(&self) -> &[Vec2] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Index of the first entry inside the cell containing `point`
    fn position<G: GridGeometry + ?Sized>(&self, point: Vec2, grid: &G) -> Option<usize> {
        let polygon = grid.polygon_of(point);
        self.areas.iter().position(|center| polygon.contains(*center))
    }

    pub fn is_revealed<G: GridGeometry + ?Sized>(&self, point: Vec2, grid: &G) -> bool {
        self.position(point, grid).is_some()
    }

    /// Reveal the cell containing `point`. Returns whether an entry was added.
    pub fn reveal<G, S>(&mut self, point: Vec2, grid: &G, document: &mut S) -> bool
    where
        G: GridGeometry + ?Sized,
        S: DocumentStore + ?Sized,
    {
        if self.is_revealed(point, grid) {
            return false;
        }

        let center = grid.center_of(point).round();
        self.areas.push(center);
        self.persist(document);
        debug!("Revealed cell at {:?} ({} total)", center, self.areas.len());
        true
    }

    /// Hide the cell containing `point`. Returns whether an entry was removed.
    ///
    /// When several entries fall inside the same cell only the first one is
    /// removed.
    pub fn unreveal<G, S>(&mut self, point: Vec2, grid: &G, document: &mut S) -> bool
    where
        G: GridGeometry + ?Sized,
        S: DocumentStore + ?Sized,
    {
        let Some(index) = self.position(point, grid) else {
            return false;
        };

        let center = self.areas.remove(index);
        self.persist(document);
        debug!("Hid cell at {:?} ({} total)", center, self.areas.len());
        true
    }

    /// Forget every revealed cell
    pub fn clear<S: DocumentStore + ?Sized>(&mut self, document: &mut S) {
        self.areas.clear();
        self.persist(document);
        info!("Cleared all revealed areas");
    }

    /// Remove the revealed sequence from a document about to be written to
    /// disk when the map does not keep explored areas between sessions.
    /// Returns whether anything was removed.
    pub fn strip_unpersisted<S: DocumentStore + ?Sized>(document: &mut S) -> bool {
        if document.get_settings().persist_explored_areas
            || document.get(FOG_NAMESPACE, KEY_REVEALED).is_none()
        {
            return false;
        }
        document.unset(FOG_NAMESPACE, KEY_REVEALED);
        debug!("Dropped revealed areas from saved map (not persisting)");
        true
    }

    fn persist<S: DocumentStore + ?Sized>(&self, document: &mut S) {
        let pairs: Vec<[f32; 2]> = self.areas.iter().map(|p| p.to_array()).collect();
        document.set(FOG_NAMESPACE, KEY_REVEALED, json!(pairs));
    }
}
