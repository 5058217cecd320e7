//! Fog layer settings.
//!
//! Settings live in the map document under the fog namespace, one key per
//! option. They are read through on every `update()`/`draw()`, and every
//! option falls back to its default at read time when it is missing or
//! cannot be parsed.

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::{DEFAULT_OPACITY_GM, DEFAULT_OPACITY_PLAYER, FOG_NAMESPACE};
use crate::map::DocumentStore;

pub const KEY_COLOR: &str = "color";
pub const KEY_REVEAL_RADIUS: &str = "revealRadius";
pub const KEY_OPACITY_GM: &str = "opacityGM";
pub const KEY_OPACITY_PLAYER: &str = "opacityPlayer";
pub const KEY_PERSIST: &str = "persistExploredAreas";
pub const KEY_ENABLED: &str = "enabled";
pub const KEY_IMAGE: &str = "image";

/// Who is looking at the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewerRole {
    /// Privileged viewer (game master)
    #[default]
    Gm,
    Player,
}

impl ViewerRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ViewerRole::Gm => "Game Master",
            ViewerRole::Player => "Player",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FogSettings {
    /// Overlay tint
    pub color: Color,
    /// Token vision radius in grid units (0 disables token reveal)
    pub reveal_radius: f32,
    pub opacity_gm: f32,
    pub opacity_player: f32,
    /// Keep revealed cells when the map is closed
    pub persist_explored_areas: bool,
    pub enabled: bool,
    /// Optional background image drawn under the mask
    pub image: Option<String>,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            reveal_radius: 0.0,
            opacity_gm: DEFAULT_OPACITY_GM,
            opacity_player: DEFAULT_OPACITY_PLAYER,
            persist_explored_areas: true,
            enabled: true,
            image: None,
        }
    }
}

impl FogSettings {
    /// Overlay alpha for the given viewer
    pub fn opacity_for(&self, role: ViewerRole) -> f32 {
        match role {
            ViewerRole::Gm => self.opacity_gm,
            ViewerRole::Player => self.opacity_player,
        }
    }

    /// Read every option from the document, filling gaps from the defaults
    pub fn load<S: DocumentStore + ?Sized>(store: &S) -> Self {
        let defaults = Self::default();

        let color = match read::<String, _>(store, KEY_COLOR) {
            Some(hex) => parse_color(&hex).unwrap_or_else(|| {
                warn!("Invalid fog color {:?}, using default", hex);
                defaults.color
            }),
            None => defaults.color,
        };

        Self {
            color,
            reveal_radius: read::<f32, _>(store, KEY_REVEAL_RADIUS)
                .unwrap_or(defaults.reveal_radius)
                .max(0.0),
            opacity_gm: read::<f32, _>(store, KEY_OPACITY_GM)
                .unwrap_or(defaults.opacity_gm)
                .clamp(0.0, 1.0),
            opacity_player: read::<f32, _>(store, KEY_OPACITY_PLAYER)
                .unwrap_or(defaults.opacity_player)
                .clamp(0.0, 1.0),
            persist_explored_areas: read(store, KEY_PERSIST)
                .unwrap_or(defaults.persist_explored_areas),
            enabled: read(store, KEY_ENABLED).unwrap_or(defaults.enabled),
            image: read::<Option<String>, _>(store, KEY_IMAGE)
                .flatten()
                .filter(|path| !path.is_empty()),
        }
    }

    /// Write every option to the document
    pub fn save<S: DocumentStore + ?Sized>(&self, store: &mut S) {
        store.set(FOG_NAMESPACE, KEY_COLOR, json!(color_to_hex(self.color)));
        store.set(FOG_NAMESPACE, KEY_REVEAL_RADIUS, json!(self.reveal_radius));
        store.set(FOG_NAMESPACE, KEY_OPACITY_GM, json!(self.opacity_gm));
        store.set(FOG_NAMESPACE, KEY_OPACITY_PLAYER, json!(self.opacity_player));
        store.set(FOG_NAMESPACE, KEY_PERSIST, json!(self.persist_explored_areas));
        store.set(FOG_NAMESPACE, KEY_ENABLED, json!(self.enabled));
        match &self.image {
            Some(path) => store.set(FOG_NAMESPACE, KEY_IMAGE, json!(path)),
            None => store.unset(FOG_NAMESPACE, KEY_IMAGE),
        }
    }
}

/// Configuration provider handed to the fog layer.
pub trait SettingsProvider {
    fn get_settings(&self) -> FogSettings;
    fn set_settings(&mut self, settings: &FogSettings);
}

impl<T: DocumentStore + ?Sized> SettingsProvider for T {
    fn get_settings(&self) -> FogSettings {
        FogSettings::load(self)
    }

    fn set_settings(&mut self, settings: &FogSettings) {
        settings.save(self);
    }
}

fn read<T: DeserializeOwned, S: DocumentStore + ?Sized>(store: &S, key: &str) -> Option<T> {
    let value: Value = store.get(FOG_NAMESPACE, key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring malformed fog setting '{}': {}", key, e);
            None
        }
    }
}

/// Parse `#rrggbb` / `#rrggbbaa` (leading `#` optional)
pub fn parse_color(hex: &str) -> Option<Color> {
    Srgba::hex(hex.trim()).ok().map(Color::from)
}

pub fn color_to_hex(color: Color) -> String {
    color.to_srgba().to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapDocument;

    #[test]
    fn test_defaults_when_document_empty() {
        let doc = MapDocument::default();
        let settings = doc.get_settings();
        assert_eq!(settings, FogSettings::default());
        assert_eq!(settings.color, Color::BLACK);
        assert_eq!(settings.reveal_radius, 0.0);
        assert!((settings.opacity_gm - 0.7).abs() < 0.001);
        assert!((settings.opacity_player - 1.0).abs() < 0.001);
        assert!(settings.image.is_none());
    }

    #[test]
    fn test_partial_document_fills_missing_from_defaults() {
        let mut doc = MapDocument::default();
        doc.set(FOG_NAMESPACE, KEY_REVEAL_RADIUS, json!(30));
        doc.set(FOG_NAMESPACE, KEY_COLOR, json!("#336699"));

        let settings = doc.get_settings();
        assert_eq!(settings.reveal_radius, 30.0);
        assert_eq!(settings.color, Color::srgb_u8(0x33, 0x66, 0x99));
        assert!((settings.opacity_gm - DEFAULT_OPACITY_GM).abs() < 0.001);
        assert!(settings.enabled);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut doc = MapDocument::default();
        doc.set(FOG_NAMESPACE, KEY_OPACITY_GM, json!("very dark"));
        doc.set(FOG_NAMESPACE, KEY_COLOR, json!("not-a-color"));
        doc.set(FOG_NAMESPACE, KEY_ENABLED, json!(12));

        let settings = doc.get_settings();
        assert!((settings.opacity_gm - DEFAULT_OPACITY_GM).abs() < 0.001);
        assert_eq!(settings.color, Color::BLACK);
        assert!(settings.enabled);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut doc = MapDocument::default();
        doc.set(FOG_NAMESPACE, KEY_OPACITY_PLAYER, json!(3.5));
        doc.set(FOG_NAMESPACE, KEY_REVEAL_RADIUS, json!(-10.0));

        let settings = doc.get_settings();
        assert_eq!(settings.opacity_player, 1.0);
        assert_eq!(settings.reveal_radius, 0.0);
    }

    #[test]
    fn test_empty_or_null_image_means_none() {
        let mut doc = MapDocument::default();
        doc.set(FOG_NAMESPACE, KEY_IMAGE, json!(""));
        assert!(doc.get_settings().image.is_none());

        doc.set(FOG_NAMESPACE, KEY_IMAGE, Value::Null);
        assert!(doc.get_settings().image.is_none());
    }

    #[test]
    fn test_set_settings_roundtrip() {
        let mut doc = MapDocument::default();
        let settings = FogSettings {
            color: Color::srgb_u8(0x10, 0x20, 0x30),
            reveal_radius: 15.0,
            opacity_gm: 0.5,
            opacity_player: 0.9,
            persist_explored_areas: false,
            enabled: false,
            image: Some("fog/parchment.png".to_string()),
        };
        doc.set_settings(&settings);
        assert_eq!(doc.get_settings(), settings);

        // Clearing the image removes the key entirely
        doc.set_settings(&FogSettings {
            image: None,
            ..settings
        });
        assert!(doc.get(FOG_NAMESPACE, KEY_IMAGE).is_none());
    }

    #[test]
    fn test_opacity_for_role() {
        let settings = FogSettings::default();
        assert_eq!(settings.opacity_for(ViewerRole::Gm), settings.opacity_gm);
        assert_eq!(settings.opacity_for(ViewerRole::Player), settings.opacity_player);
    }

    #[test]
    fn test_color_hex_roundtrip() {
        let color = Color::srgb_u8(0xab, 0xcd, 0xef);
        let hex = color_to_hex(color);
        assert_eq!(parse_color(&hex), Some(color));
        assert_eq!(parse_color("#000000"), Some(Color::BLACK));
    }
}
