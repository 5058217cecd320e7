//! Darkening overlay composed over the map.
//!
//! The overlay is a full-canvas tinted background, optionally covered by a
//! background image stretched over the canvas. Those base pixels are built
//! once per tint, image or size change. Mask rebuilds only rewrite the alpha
//! channel (base alpha scaled by the mask, so black mask pixels punch
//! through), and the viewer's opacity is applied as the sprite colour.

use bevy::prelude::*;
use image::{GrayImage, Rgba, RgbaImage};

use super::image_load::{ImageLoader, PendingImageLoads};
use super::mask::HIDDEN;

pub struct OverlayRenderer {
    size: UVec2,
    tint: Color,
    opacity: f32,
    /// False while the overlay is cleared (layer disabled)
    background_drawn: bool,
    fog_image: Option<RgbaImage>,
    /// Image most recently requested through `request_image`
    image_path: Option<String>,
    pending: PendingImageLoads,
    /// Unmasked overlay pixels
    base: RgbaImage,
    revision: u64,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            size: UVec2::ONE,
            tint: Color::BLACK,
            opacity: 1.0,
            background_drawn: false,
            fog_image: None,
            image_path: None,
            pending: PendingImageLoads::default(),
            base: RgbaImage::new(1, 1),
            revision: 0,
        }
    }
}

impl OverlayRenderer {
    /// Allocate the overlay for a canvas of the given size
    pub fn initialize(&mut self, size: UVec2) {
        self.size = size.max(UVec2::ONE);
        self.background_drawn = false;
        self.redraw_base();
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Bumped whenever the base pixels change (not on opacity changes)
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_drawn(&self) -> bool {
        self.background_drawn
    }

    pub fn tint(&self) -> Color {
        self.tint
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Colour the overlay sprite is drawn with
    pub fn sprite_color(&self) -> Color {
        Color::WHITE.with_alpha(self.opacity)
    }

    pub fn fog_image(&self) -> Option<&RgbaImage> {
        self.fog_image.as_ref()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Redraw the background fill at the current size with the given tint
    pub fn refresh_overlay(&mut self, tint: Color) {
        self.tint = tint;
        self.background_drawn = true;
        self.redraw_base();
    }

    /// Erase the drawn background
    pub fn clear(&mut self) {
        if self.background_drawn {
            self.background_drawn = false;
            self.redraw_base();
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Start loading `path` onto the fog sprite, or clear the sprite's image
    /// when no path is given.
    pub fn request_image(&mut self, loader: &dyn ImageLoader, path: Option<&str>) {
        self.image_path = path.map(str::to_string);
        match path {
            Some(path) => self.pending.start(loader, path),
            None => {
                if self.fog_image.take().is_some() {
                    self.redraw_base();
                }
            }
        }
    }

    /// Drop loads that have not completed yet
    pub fn cancel_image_loads(&mut self) {
        self.pending.cancel_all();
    }

    /// Apply every load that completed since the last poll. Returns whether
    /// the fog image changed.
    pub fn poll_image_loads(&mut self) -> bool {
        let completed = self.pending.poll();
        let changed = !completed.is_empty();
        for (_, image) in completed {
            self.fog_image = Some(image);
        }
        if changed {
            self.redraw_base();
        }
        changed
    }

    /// Overlay pixels for the given mask: the base with its alpha scaled
    /// by the mask
    pub fn compose(&self, mask: &GrayImage) -> RgbaImage {
        let mut out = self.base.clone();
        self.write_mask_alpha(mask, &mut out);
        out
    }

    /// Rewrite only the alpha channel of pixels previously produced by
    /// [`Self::compose`] at the same revision
    pub fn write_mask_alpha(&self, mask: &GrayImage, rgba: &mut [u8]) {
        let same_size = mask.dimensions() == self.base.dimensions();
        for (i, (out, base)) in rgba.chunks_exact_mut(4).zip(self.base.pixels()).enumerate() {
            let coverage = if same_size {
                mask.as_raw()[i]
            } else {
                HIDDEN
            };
            out[3] = scale_alpha(base[3], coverage);
        }
    }

    fn redraw_base(&mut self) {
        self.revision += 1;
        let (width, height) = (self.size.x, self.size.y);
        if !self.background_drawn {
            self.base = RgbaImage::new(width, height);
            return;
        }

        let tint = self.tint.to_srgba();
        let tint_rgb = [tint.red, tint.green, tint.blue];
        let fog_image = self.fog_image.as_ref();

        self.base = RgbaImage::from_fn(width, height, |x, y| {
            let (rgb, alpha) = match fog_image {
                Some(img) => {
                    let sx = (x as u64 * img.width() as u64 / width as u64) as u32;
                    let sy = (y as u64 * img.height() as u64 / height as u64) as u32;
                    let px = img.get_pixel(sx, sy).0;
                    let ia = px[3] as f32 / 255.0;
                    let rgb = [0, 1, 2]
                        .map(|c| px[c] as f32 / 255.0 * ia + tint_rgb[c] * (1.0 - ia));
                    (rgb, ia + tint.alpha * (1.0 - ia))
                }
                None => (tint_rgb, tint.alpha),
            };
            Rgba([
                to_u8(rgb[0]),
                to_u8(rgb[1]),
                to_u8(rgb[2]),
                to_u8(alpha),
            ])
        });
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn scale_alpha(alpha: u8, coverage: u8) -> u8 {
    ((alpha as u16 * coverage as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fog::image_load::test_support::ManualLoader;
    use crate::fog::mask::REVEALED;
    use image::Luma;

    fn mask_with_hole() -> GrayImage {
        let mut mask = GrayImage::from_pixel(4, 4, Luma([HIDDEN]));
        mask.put_pixel(1, 1, Luma([REVEALED]));
        mask
    }

    fn drawn_overlay() -> OverlayRenderer {
        let mut overlay = OverlayRenderer::default();
        overlay.initialize(UVec2::new(4, 4));
        overlay.refresh_overlay(Color::BLACK);
        overlay
    }

    #[test]
    fn test_undrawn_overlay_is_transparent() {
        let mut overlay = OverlayRenderer::default();
        overlay.initialize(UVec2::new(4, 4));
        let out = overlay.compose(&mask_with_hole());
        assert!(out.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_mask_punches_through_overlay() {
        let overlay = drawn_overlay();
        let out = overlay.compose(&mask_with_hole());

        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn test_opacity_goes_to_sprite_color() {
        let mut overlay = drawn_overlay();
        let revision = overlay.revision();
        overlay.set_opacity(0.5);

        assert_eq!(overlay.sprite_color().alpha(), 0.5);
        assert_eq!(overlay.revision(), revision);
        assert_eq!(overlay.compose(&mask_with_hole()).get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_mask_update_touches_only_alpha() {
        let overlay = drawn_overlay();
        let mut pixels = overlay.compose(&GrayImage::from_pixel(4, 4, Luma([HIDDEN])));

        overlay.write_mask_alpha(&mask_with_hole(), &mut pixels);
        assert_eq!(pixels, overlay.compose(&mask_with_hole()));
        assert_eq!(pixels.get_pixel(1, 1).0, [0, 0, 0, 0]);
        assert_eq!(pixels.get_pixel(2, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_translucent_image_alpha_scaled_by_mask() {
        let loader = ManualLoader::default();
        let mut overlay = OverlayRenderer::default();
        overlay.initialize(UVec2::new(4, 4));
        overlay.refresh_overlay(Color::NONE);
        overlay.request_image(&loader, Some("wash.png"));
        loader.complete("wash.png", [255, 255, 255, 128]);
        overlay.poll_image_loads();

        let mut mask = GrayImage::from_pixel(4, 4, Luma([HIDDEN]));
        mask.put_pixel(0, 0, Luma([REVEALED]));
        mask.put_pixel(1, 0, Luma([128]));
        let out = overlay.compose(&mask);

        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 0)[3], 64);
        assert_eq!(out.get_pixel(2, 0)[3], 128);
    }

    #[test]
    fn test_tint_color_applied() {
        let mut overlay = drawn_overlay();
        overlay.refresh_overlay(Color::srgb(1.0, 0.0, 0.0));
        let out = overlay.compose(&mask_with_hole());
        assert_eq!(out.get_pixel(3, 3).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_clear_bumps_revision_once() {
        let mut overlay = drawn_overlay();
        let rev = overlay.revision();
        overlay.clear();
        overlay.clear();
        assert_eq!(overlay.revision(), rev + 1);
        assert!(!overlay.is_drawn());
    }

    #[test]
    fn test_fog_image_drawn_over_tint() {
        let loader = ManualLoader::default();
        let mut overlay = drawn_overlay();
        overlay.request_image(&loader, Some("parchment.png"));
        assert!(!overlay.poll_image_loads());

        loader.complete("parchment.png", [0, 0, 255, 255]);
        assert!(overlay.poll_image_loads());

        let out = overlay.compose(&mask_with_hole());
        assert_eq!(out.get_pixel(3, 0).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn test_last_completed_load_wins() {
        let loader = ManualLoader::default();
        let mut overlay = drawn_overlay();
        overlay.request_image(&loader, Some("first.png"));
        overlay.request_image(&loader, Some("second.png"));
        assert_eq!(overlay.image_path(), Some("second.png"));

        loader.complete("second.png", [0, 255, 0, 255]);
        overlay.poll_image_loads();
        // The stale load finishes later and overwrites the newer image
        loader.complete("first.png", [255, 0, 0, 255]);
        overlay.poll_image_loads();

        let img = overlay.fog_image().unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_failed_load_keeps_previous_image() {
        let loader = ManualLoader::default();
        let mut overlay = drawn_overlay();
        overlay.request_image(&loader, Some("good.png"));
        loader.complete("good.png", [0, 255, 0, 255]);
        overlay.poll_image_loads();

        overlay.request_image(&loader, Some("bad.png"));
        loader.fail("bad.png");
        assert!(!overlay.poll_image_loads());
        assert_eq!(overlay.fog_image().unwrap().get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_request_none_clears_image() {
        let loader = ManualLoader::default();
        let mut overlay = drawn_overlay();
        overlay.request_image(&loader, Some("good.png"));
        loader.complete("good.png", [0, 255, 0, 255]);
        overlay.poll_image_loads();

        overlay.request_image(&loader, None);
        assert!(overlay.fog_image().is_none());
        assert!(overlay.image_path().is_none());
    }
}
