//! Binary visibility mask.
//!
//! The mask is an 8-bit image the size of the canvas: white (255) pixels are
//! hidden, black (0) pixels are revealed. It is derived state only and gets
//! recomputed from scratch on every rebuild from the revealed cells, the
//! observer tokens, and the reveal radius.

use bevy::prelude::*;
use image::{GrayImage, Luma};

use crate::map::{CellPolygon, GridGeometry};

use super::tokens::PlacedToken;

pub const HIDDEN: u8 = 255;
pub const REVEALED: u8 = 0;

/// Shapes punched into the mask during one rebuild
#[derive(Debug, Clone)]
enum MaskShape {
    Polygon(CellPolygon),
    Circle { center: Vec2, radius: f32 },
}

#[derive(Debug, Clone)]
pub struct MaskCompositor {
    mask: GrayImage,
    revision: u64,
}

impl Default for MaskCompositor {
    fn default() -> Self {
        Self::new(UVec2::ONE)
    }
}

impl MaskCompositor {
    /// Allocate a fully hidden mask
    pub fn new(size: UVec2) -> Self {
        let size = size.max(UVec2::ONE);
        Self {
            mask: GrayImage::from_pixel(size.x, size.y, Luma([HIDDEN])),
            revision: 0,
        }
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.mask.width(), self.mask.height())
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Bumped on every rebuild
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mask value under a map position, `None` outside the canvas
    pub fn value_at(&self, point: Vec2) -> Option<u8> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let (x, y) = (point.x as u32, point.y as u32);
        if x >= self.mask.width() || y >= self.mask.height() {
            return None;
        }
        Some(self.mask.get_pixel(x, y)[0])
    }

    pub fn is_revealed_at(&self, point: Vec2) -> bool {
        self.value_at(point) == Some(REVEALED)
    }

    /// Redraw the whole mask.
    ///
    /// Every revealed cell is filled with its grid polygon. When
    /// `reveal_radius` is positive, every observer token also punches a circle
    /// of its light-adjusted radius around its centre.
    pub fn rebuild<G: GridGeometry + ?Sized>(
        &mut self,
        areas: &[Vec2],
        observers: &[PlacedToken],
        reveal_radius: f32,
        grid: &G,
    ) {
        let mut shapes: Vec<MaskShape> = areas
            .iter()
            .map(|center| MaskShape::Polygon(grid.polygon_of(*center)))
            .collect();

        if reveal_radius > 0.0 {
            shapes.extend(observers.iter().filter(|t| t.observer).map(|token| {
                MaskShape::Circle {
                    center: token.center,
                    radius: token.light_radius(reveal_radius, grid),
                }
            }));
        }

        for pixel in self.mask.pixels_mut() {
            *pixel = Luma([HIDDEN]);
        }
        for shape in &shapes {
            match shape {
                MaskShape::Polygon(polygon) => fill_polygon(&mut self.mask, polygon),
                MaskShape::Circle { center, radius } => {
                    fill_circle(&mut self.mask, *center, *radius)
                }
            }
        }

        self.revision += 1;
        debug!(
            "Rebuilt fog mask: {} cells, {} observer circles",
            areas.len(),
            shapes.len() - areas.len()
        );
    }
}

/// Scanline fill sampling pixel centres (even-odd rule)
fn fill_polygon(mask: &mut GrayImage, polygon: &CellPolygon) {
    let points = &polygon.points;
    if points.len() < 3 {
        return;
    }

    let (min, max) = polygon.bounds();
    let (width, height) = (mask.width() as i64, mask.height() as i64);
    let y_start = (min.y.floor() as i64).max(0);
    let y_end = (max.y.ceil() as i64).min(height);

    let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
    for y in y_start..y_end {
        let sample_y = y as f32 + 0.5;
        crossings.clear();

        let mut j = points.len() - 1;
        for i in 0..points.len() {
            let (a, b) = (points[i], points[j]);
            if (a.y > sample_y) != (b.y > sample_y) {
                crossings.push((b.x - a.x) * (sample_y - a.y) / (b.y - a.y) + a.x);
            }
            j = i;
        }
        crossings.sort_by(f32::total_cmp);

        for span in crossings.chunks_exact(2) {
            // Pixels whose centre lies in [span[0], span[1])
            let x_start = ((span[0] - 0.5).ceil() as i64).max(0);
            let x_end = ((span[1] - 0.5).ceil() as i64).min(width);
            for x in x_start..x_end {
                mask.put_pixel(x as u32, y as u32, Luma([REVEALED]));
            }
        }
    }
}

fn fill_circle(mask: &mut GrayImage, center: Vec2, radius: f32) {
    if radius <= 0.0 {
        return;
    }

    let (width, height) = (mask.width() as i64, mask.height() as i64);
    let y_start = ((center.y - radius).floor() as i64).max(0);
    let y_end = ((center.y + radius).ceil() as i64).min(height);
    let x_start = ((center.x - radius).floor() as i64).max(0);
    let x_end = ((center.x + radius).ceil() as i64).min(width);
    let radius_sq = radius * radius;

    for y in y_start..y_end {
        let dy = y as f32 + 0.5 - center.y;
        for x in x_start..x_end {
            let dx = x as f32 + 0.5 - center.x;
            if dx * dx + dy * dy <= radius_sq {
                mask.put_pixel(x as u32, y as u32, Luma([REVEALED]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::SquareGrid;

    fn compositor() -> (MaskCompositor, SquareGrid) {
        (MaskCompositor::new(UVec2::new(600, 600)), SquareGrid::new(50.0))
    }

    #[test]
    fn test_new_mask_is_fully_hidden() {
        let (mask, _) = compositor();
        assert_eq!(mask.size(), UVec2::new(600, 600));
        assert!(mask.mask().pixels().all(|p| p[0] == HIDDEN));
        assert_eq!(mask.revision(), 0);
    }

    #[test]
    fn test_revealed_cell_is_black() {
        let (mut mask, grid) = compositor();
        mask.rebuild(&[Vec2::new(25.0, 25.0)], &[], 0.0, &grid);

        assert!(mask.is_revealed_at(Vec2::new(0.0, 0.0)));
        assert!(mask.is_revealed_at(Vec2::new(49.0, 49.0)));
        assert!(!mask.is_revealed_at(Vec2::new(50.0, 10.0)));
        assert!(!mask.is_revealed_at(Vec2::new(10.0, 50.0)));
        assert_eq!(mask.revision(), 1);
    }

    #[test]
    fn test_cell_fill_covers_exactly_one_cell() {
        let (mut mask, grid) = compositor();
        mask.rebuild(&[Vec2::new(75.0, 125.0)], &[], 0.0, &grid);

        let revealed = mask.mask().pixels().filter(|p| p[0] == REVEALED).count();
        assert_eq!(revealed, 50 * 50);
    }

    #[test]
    fn test_observer_circle_scenario() {
        let (mut mask, grid) = compositor();
        let token = PlacedToken::observer(Vec2::new(100.0, 100.0), 50.0);
        mask.rebuild(&[], &[token], 30.0, &grid);

        assert!(mask.is_revealed_at(Vec2::new(100.0, 100.0)));
        assert!(!mask.is_revealed_at(Vec2::new(500.0, 500.0)));
    }

    #[test]
    fn test_zero_radius_ignores_tokens() {
        let (mut mask, grid) = compositor();
        let token = PlacedToken::observer(Vec2::new(100.0, 100.0), 50.0);
        mask.rebuild(&[], &[token], 0.0, &grid);

        assert!(mask.mask().pixels().all(|p| p[0] == HIDDEN));
    }

    #[test]
    fn test_non_observer_tokens_ignored() {
        let (mut mask, grid) = compositor();
        let token = PlacedToken {
            center: Vec2::new(100.0, 100.0),
            width: 50.0,
            observer: false,
        };
        mask.rebuild(&[], &[token], 30.0, &grid);
        assert!(!mask.is_revealed_at(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_removed_token_reveal_disappears_on_rebuild() {
        let (mut mask, grid) = compositor();
        let token = PlacedToken::observer(Vec2::new(300.0, 300.0), 50.0);
        mask.rebuild(&[], &[token], 5.0, &grid);
        assert!(mask.is_revealed_at(Vec2::new(300.0, 300.0)));

        mask.rebuild(&[], &[], 5.0, &grid);
        assert!(!mask.is_revealed_at(Vec2::new(300.0, 300.0)));
    }

    #[test]
    fn test_additional_cell_keeps_previous_reveals() {
        let (mut mask, grid) = compositor();
        let first = [Vec2::new(25.0, 25.0)];
        mask.rebuild(&first, &[], 0.0, &grid);
        let before: Vec<(u32, u32)> = mask
            .mask()
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == REVEALED)
            .map(|(x, y, _)| (x, y))
            .collect();

        let both = [Vec2::new(25.0, 25.0), Vec2::new(275.0, 325.0)];
        mask.rebuild(&both, &[], 0.0, &grid);
        for (x, y) in before {
            assert_eq!(mask.mask().get_pixel(x, y)[0], REVEALED);
        }
        assert!(mask.is_revealed_at(Vec2::new(260.0, 310.0)));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let (mut mask, grid) = compositor();
        let areas = [Vec2::new(25.0, 25.0), Vec2::new(125.0, 75.0)];
        let token = PlacedToken::observer(Vec2::new(400.0, 400.0), 50.0);

        mask.rebuild(&areas, &[token], 10.0, &grid);
        let first = mask.mask().clone();
        mask.rebuild(&areas, &[token], 10.0, &grid);
        assert_eq!(mask.mask(), &first);
    }

    #[test]
    fn test_shapes_outside_canvas_are_clipped() {
        let (mut mask, grid) = compositor();
        let token = PlacedToken::observer(Vec2::new(-20.0, -20.0), 50.0);
        mask.rebuild(&[Vec2::new(-25.0, 575.0), Vec2::new(975.0, 25.0)], &[token], 5.0, &grid);

        assert!(mask.is_revealed_at(Vec2::new(10.0, 10.0)));
        assert!(mask.value_at(Vec2::new(-1.0, 10.0)).is_none());
        assert!(mask.value_at(Vec2::new(600.0, 10.0)).is_none());
    }
}
