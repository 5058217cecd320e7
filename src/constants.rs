//! Centralized constants used across the application.
//!
//! Names that the map document format depends on live here too: changing
//! them breaks existing map files.

/// Default window width in pixels (also used for grid viewport calculations)
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels (also used for grid viewport calculations)
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Document namespace holding every fog key
pub const FOG_NAMESPACE: &str = "fog";

/// Document key for the revealed cell centres
pub const KEY_REVEALED: &str = "revealed";

/// Highlight layer used while editing
pub const HIGHLIGHT_LAYER: &str = "FogExplorationEditing";

/// Overlay alpha seen by the game master
pub const DEFAULT_OPACITY_GM: f32 = 0.7;

/// Overlay alpha seen by players
pub const DEFAULT_OPACITY_PLAYER: f32 = 1.0;

/// Z order of the fog overlay sprite (above the map, below gizmos)
pub const FOG_OVERLAY_Z: f32 = 50.0;

/// Z order of observer token sprites
pub const TOKEN_Z: f32 = 10.0;

/// File extension of saved maps
pub const MAP_FILE_EXTENSION: &str = "json";
