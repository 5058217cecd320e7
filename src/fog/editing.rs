//! Interactive reveal/hide editing.
//!
//! While editing is active, a primary press toggles the cell under the
//! pointer and starts a stroke: dragging with the button held applies the
//! same action (reveal or hide) to every cell the pointer enters. Moving the
//! pointer without the button only moves the highlight. The highlight colour
//! shows what the next click on that cell would do.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::constants::HIGHLIGHT_LAYER;
use crate::theme;

/// Mouse buttons the layer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input in map coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press { position: Vec2, button: PointerButton },
    Move { position: Vec2, primary_held: bool },
    Release { button: PointerButton },
}

/// One highlighted grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightCell {
    /// Top-left corner of the cell
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub border: Color,
}

/// Cell highlight capability
pub trait CellHighlighter {
    fn highlight(&mut self, layer_name: &str, cell: HighlightCell);
    fn clear_highlight(&mut self, layer_name: &str);
}

/// Named highlight layers, drawn by the host every frame
#[derive(Debug, Clone, Default)]
pub struct HighlightLayers {
    layers: BTreeMap<String, Vec<HighlightCell>>,
}

impl HighlightLayers {
    pub fn cells(&self, layer_name: &str) -> &[HighlightCell] {
        self.layers.get(layer_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &HighlightCell> {
        self.layers.values().flatten()
    }
}

impl CellHighlighter for HighlightLayers {
    fn highlight(&mut self, layer_name: &str, cell: HighlightCell) {
        self.layers
            .entry(layer_name.to_string())
            .or_default()
            .push(cell);
    }

    fn clear_highlight(&mut self, layer_name: &str) {
        self.layers.remove(layer_name);
    }
}

/// What the editor needs from the fog layer
pub trait RevealCells {
    fn is_enabled(&self) -> bool;
    fn is_revealed(&self, point: Vec2) -> bool;
    fn reveal(&mut self, point: Vec2) -> bool;
    fn unreveal(&mut self, point: Vec2) -> bool;
    fn cell_top_left(&self, point: Vec2) -> Vec2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeMode {
    Reveal,
    Hide,
}

#[derive(Debug, Clone, Default)]
pub struct EditingController {
    state: EditState,
    stroke: Option<StrokeMode>,
}

impl EditingController {
    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_editing(&self) -> bool {
        self.state == EditState::Editing
    }

    pub fn stroke(&self) -> Option<StrokeMode> {
        self.stroke
    }

    /// Enter or leave editing. Any transition clears the highlight.
    pub fn set_editing(&mut self, active: bool, highlighter: &mut dyn CellHighlighter) {
        let next = if active {
            EditState::Editing
        } else {
            EditState::Idle
        };
        if next == self.state {
            return;
        }

        self.state = next;
        self.stroke = None;
        highlighter.clear_highlight(HIGHLIGHT_LAYER);
        debug!("Fog editing {:?}", next);
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        cells: &mut dyn RevealCells,
        highlighter: &mut dyn CellHighlighter,
    ) {
        if !self.is_editing() || !cells.is_enabled() {
            return;
        }

        match event {
            PointerEvent::Press {
                position,
                button: PointerButton::Primary,
            } => {
                let mode = if cells.is_revealed(position) {
                    cells.unreveal(position);
                    StrokeMode::Hide
                } else {
                    cells.reveal(position);
                    StrokeMode::Reveal
                };
                self.stroke = Some(mode);
                self.show_highlight(position, cells, highlighter);
            }
            PointerEvent::Press { .. } => {}
            PointerEvent::Move {
                position,
                primary_held,
            } => {
                if primary_held && let Some(mode) = self.stroke {
                    match mode {
                        StrokeMode::Reveal if !cells.is_revealed(position) => {
                            cells.reveal(position);
                        }
                        StrokeMode::Hide if cells.is_revealed(position) => {
                            cells.unreveal(position);
                        }
                        _ => {}
                    }
                }
                self.show_highlight(position, cells, highlighter);
            }
            PointerEvent::Release {
                button: PointerButton::Primary,
            } => {
                self.stroke = None;
            }
            PointerEvent::Release { .. } => {}
        }
    }

    fn show_highlight(
        &self,
        position: Vec2,
        cells: &dyn RevealCells,
        highlighter: &mut dyn CellHighlighter,
    ) {
        let top_left = cells.cell_top_left(position);
        let color = if cells.is_revealed(position) {
            theme::FOG_HIGHLIGHT_HIDE
        } else {
            theme::FOG_HIGHLIGHT_REVEAL
        };

        highlighter.clear_highlight(HIGHLIGHT_LAYER);
        highlighter.highlight(
            HIGHLIGHT_LAYER,
            HighlightCell {
                x: top_left.x,
                y: top_left.y,
                color,
                border: theme::FOG_HIGHLIGHT_BORDER,
            },
        );
    }
}
