//! Centralized color theme for the application.
//!
//! This module provides all colors used throughout the editor UI and rendering.
//! Modify values here to change the application's color scheme.

use bevy::prelude::{Color, ColorToPacked};
use bevy_egui::egui;

// ============================================================================
// Grid Colors
// ============================================================================

/// Semi-transparent grey grid lines
pub const GRID_COLOR: Color = Color::srgba(0.5, 0.5, 0.5, 0.3);

// ============================================================================
// Fog of War Colors
// ============================================================================

/// Highlight for a hidden cell (next click reveals it)
pub const FOG_HIGHLIGHT_REVEAL: Color = Color::srgba(0.2, 0.9, 0.3, 0.35);

/// Highlight for a revealed cell (next click hides it)
pub const FOG_HIGHLIGHT_HIDE: Color = Color::srgba(0.9, 0.2, 0.2, 0.35);

/// Outline drawn around the highlighted cell
pub const FOG_HIGHLIGHT_BORDER: Color = Color::srgba(1.0, 1.0, 1.0, 0.8);

/// Map canvas background
pub const CANVAS_BACKGROUND: Color = Color::srgb(0.35, 0.32, 0.27);

/// Canvas outline
pub const CANVAS_BORDER: Color = Color::srgba(1.0, 1.0, 1.0, 0.4);

// ============================================================================
// Token Colors
// ============================================================================

/// Observer token fill
pub const TOKEN_OBSERVER: Color = Color::srgb(0.95, 0.75, 0.2);

/// Non-observer token fill
pub const TOKEN_PLAIN: Color = Color::srgb(0.6, 0.6, 0.65);

/// Light radius ring around observer tokens
pub const TOKEN_LIGHT_RING: Color = Color::srgba(1.0, 0.9, 0.5, 0.6);

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Grey for help/hint text
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// Red for error messages
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::RED;
}

// ============================================================================
// Color Conversion Utilities
// ============================================================================

/// Convert a Bevy Color to egui Color32 (preserving alpha)
pub fn bevy_to_egui(color: Color) -> egui::Color32 {
    let [r, g, b, a] = color.to_srgba().to_u8_array();
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Convert an egui Color32 to Bevy Color
pub fn egui_to_bevy(color: egui::Color32) -> Color {
    Color::srgba(
        color.r() as f32 / 255.0,
        color.g() as f32 / 255.0,
        color.b() as f32 / 255.0,
        color.a() as f32 / 255.0,
    )
}
