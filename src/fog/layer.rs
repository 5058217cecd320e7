//! The fog exploration layer.
//!
//! [`FogLayer`] owns the reveal store, the mask, the overlay and the editing
//! state, and reaches the host only through the capabilities it was built
//! with (document, grid geometry, image loader). The host drives it through
//! [`LayerLifecycle`] and the operations below.
//!
//! Control flow: editing mutates the store, every store mutation rebuilds
//! the mask, and the mask feeds the overlay composition. Settings are read
//! through from the document on every `draw()`/`update()`; they are never
//! cached past one call.
//!
//! A disabled layer is inert: reveal/unreveal, overlay and mask refreshes,
//! and pointer handling all do nothing.

use bevy::prelude::*;
use image::RgbaImage;

use crate::map::{DocumentStore, GridGeometry};

use super::editing::{
    CellHighlighter, EditingController, HighlightLayers, PointerEvent, RevealCells,
};
use super::image_load::ImageLoader;
use super::mask::MaskCompositor;
use super::overlay::OverlayRenderer;
use super::settings::{FogSettings, SettingsProvider, ViewerRole};
use super::store::RevealStore;
use super::tokens::{PlacedToken, TokenQuery};

/// Lifecycle hooks the host invokes on a layer
pub trait LayerLifecycle {
    /// Allocate render targets for the current canvas
    fn initialize(&mut self);
    /// (Re)draw from scratch: reset transient state and apply settings
    fn draw(&mut self);
    /// Re-apply settings
    fn update(&mut self);
    /// Release the layer when its map is closed
    fn teardown(&mut self);
}

pub type BoxedDocument = Box<dyn DocumentStore + Send + Sync>;
pub type BoxedGrid = Box<dyn GridGeometry + Send + Sync>;
pub type BoxedLoader = Box<dyn ImageLoader + Send + Sync>;

#[derive(Resource)]
pub struct FogLayer {
    document: BoxedDocument,
    grid: BoxedGrid,
    loader: BoxedLoader,
    canvas: UVec2,
    role: ViewerRole,
    enabled: bool,
    store: RevealStore,
    mask: MaskCompositor,
    overlay: OverlayRenderer,
    editing: EditingController,
    highlights: HighlightLayers,
    observers: Vec<PlacedToken>,
}

impl FogLayer {
    pub fn new(document: BoxedDocument, grid: BoxedGrid, loader: BoxedLoader, canvas: UVec2) -> Self {
        let store = RevealStore::load(&*document);
        let enabled = document.get_settings().enabled;
        Self {
            document,
            grid,
            loader,
            canvas,
            role: ViewerRole::default(),
            enabled,
            store,
            mask: MaskCompositor::new(canvas),
            overlay: OverlayRenderer::default(),
            editing: EditingController::default(),
            highlights: HighlightLayers::default(),
            observers: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Settings and host configuration
    // ------------------------------------------------------------------

    /// Current settings, read through from the document
    pub fn settings(&self) -> FogSettings {
        self.document.get_settings()
    }

    /// Persist new settings and apply them
    pub fn set_settings(&mut self, settings: &FogSettings) {
        self.document.set_settings(settings);
        self.update();
    }

    pub fn viewer_role(&self) -> ViewerRole {
        self.role
    }

    pub fn set_viewer_role(&mut self, role: ViewerRole) {
        if self.role != role {
            self.role = role;
            self.update();
        }
    }

    /// Swap grid geometry (takes effect on the next draw)
    pub fn set_grid(&mut self, grid: BoxedGrid) {
        self.grid = grid;
    }

    /// Change canvas dimensions (takes effect on the next draw)
    pub fn set_canvas(&mut self, canvas: UVec2) {
        self.canvas = canvas;
    }

    pub fn canvas(&self) -> UVec2 {
        self.canvas
    }

    pub fn grid(&self) -> &(dyn GridGeometry + Send + Sync) {
        &*self.grid
    }

    // ------------------------------------------------------------------
    // Enabled / editing flags
    // ------------------------------------------------------------------

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enabling redraws overlay and mask; disabling clears the overlay and
    /// leaves editing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.refresh_overlay();
            self.refresh_mask();
        } else {
            self.overlay.clear();
            self.editing.set_editing(false, &mut self.highlights);
        }
        info!("Fog layer {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn editing(&self) -> bool {
        self.editing.is_editing()
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing.set_editing(editing, &mut self.highlights);
    }

    // ------------------------------------------------------------------
    // Reveal store
    // ------------------------------------------------------------------

    pub fn is_revealed(&self, point: Vec2) -> bool {
        self.store.is_revealed(point, &*self.grid)
    }

    /// Reveal the cell under `point`; returns whether a cell was added
    pub fn reveal(&mut self, point: Vec2) -> bool {
        if !self.enabled {
            return false;
        }
        let changed = self.store.reveal(point, &*self.grid, &mut *self.document);
        if changed {
            self.refresh_mask();
        }
        changed
    }

    /// Hide the cell under `point`; returns whether a cell was removed
    pub fn unreveal(&mut self, point: Vec2) -> bool {
        if !self.enabled {
            return false;
        }
        let changed = self.store.unreveal(point, &*self.grid, &mut *self.document);
        if changed {
            self.refresh_mask();
        }
        changed
    }

    /// Forget every revealed cell
    pub fn clear(&mut self) {
        self.store.clear(&mut *self.document);
        self.refresh_mask();
    }

    pub fn store(&self) -> &RevealStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Redraw the overlay background with the current tint
    pub fn refresh_overlay(&mut self) {
        if !self.enabled {
            return;
        }
        let tint = self.settings().color;
        self.overlay.refresh_overlay(tint);
    }

    /// Rebuild the visibility mask from the store and observer tokens
    pub fn refresh_mask(&mut self) {
        if !self.enabled {
            return;
        }
        let radius = self.settings().reveal_radius;
        self.mask
            .rebuild(self.store.areas(), &self.observers, radius, &*self.grid);
    }

    /// Load the configured background image, or clear it when the layer is
    /// disabled or no image is configured.
    pub fn refresh_image(&mut self) {
        let image = self.settings().image;
        let path = image.as_deref().filter(|_| self.enabled);
        self.overlay.request_image(&*self.loader, path);
    }

    /// Apply completed background image loads (call once per frame).
    /// While the layer is disabled completions stay pending.
    pub fn poll_image_loads(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.overlay.poll_image_loads()
    }

    /// Replace the observer snapshot; rebuilds the mask when it changed
    pub fn sync_tokens<T: TokenQuery + ?Sized>(&mut self, tokens: &T) -> bool {
        let observers = tokens.observers();
        if observers == self.observers {
            return false;
        }
        self.observers = observers;
        self.refresh_mask();
        true
    }

    pub fn mask(&self) -> &MaskCompositor {
        &self.mask
    }

    pub fn overlay(&self) -> &OverlayRenderer {
        &self.overlay
    }

    pub fn highlights(&self) -> &HighlightLayers {
        &self.highlights
    }

    /// (mask revision, overlay base revision)
    pub fn frame_revision(&self) -> (u64, u64) {
        (self.mask.revision(), self.overlay.revision())
    }

    /// Overlay pixels with the mask applied
    pub fn compose_frame(&self) -> RgbaImage {
        self.overlay.compose(self.mask.mask())
    }

    /// Refresh just the alpha channel of a frame composed at the current
    /// overlay base revision
    pub fn write_mask_alpha(&self, rgba: &mut [u8]) {
        self.overlay.write_mask_alpha(self.mask.mask(), rgba);
    }

    /// Sprite colour carrying the viewer's opacity
    pub fn overlay_color(&self) -> Color {
        self.overlay.sprite_color()
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let mut editing = std::mem::take(&mut self.editing);
        let mut highlights = std::mem::take(&mut self.highlights);
        editing.handle(event, self, &mut highlights);
        self.editing = editing;
        self.highlights = highlights;
    }
}

impl RevealCells for FogLayer {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_revealed(&self, point: Vec2) -> bool {
        FogLayer::is_revealed(self, point)
    }

    fn reveal(&mut self, point: Vec2) -> bool {
        FogLayer::reveal(self, point)
    }

    fn unreveal(&mut self, point: Vec2) -> bool {
        FogLayer::unreveal(self, point)
    }

    fn cell_top_left(&self, point: Vec2) -> Vec2 {
        self.grid.top_left_of(point)
    }
}

impl LayerLifecycle for FogLayer {
    fn initialize(&mut self) {
        self.store = RevealStore::load(&*self.document);
        self.mask = MaskCompositor::new(self.canvas);
        self.overlay.initialize(self.canvas);
    }

    fn draw(&mut self) {
        self.editing.set_editing(false, &mut self.highlights);
        self.initialize();

        let settings = self.settings();
        self.enabled = settings.enabled;
        self.refresh_overlay();
        self.refresh_image();
        self.update();

        info!(
            "Drew fog layer: {}x{} canvas, {} revealed cells",
            self.canvas.x,
            self.canvas.y,
            self.store.len()
        );
    }

    fn update(&mut self) {
        let settings = self.settings();

        if settings.enabled != self.enabled {
            self.set_enabled(settings.enabled);
        }
        if !self.enabled || settings.image.as_deref() != self.overlay.image_path() {
            self.refresh_image();
        }
        if self.enabled && settings.color != self.overlay.tint() {
            self.refresh_overlay();
        }

        self.overlay.set_opacity(settings.opacity_for(self.role));
        self.refresh_mask();
    }

    fn teardown(&mut self) {
        self.editing.set_editing(false, &mut self.highlights);
        self.overlay.cancel_image_loads();
        if !self.settings().persist_explored_areas {
            self.store.clear(&mut *self.document);
        }
        info!("Tore down fog layer");
    }
}
