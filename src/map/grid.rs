//! Grid geometry consumed by the fog layer.
//!
//! The fog layer never reasons about grid types directly. It only asks for the
//! cell containing a point: its top-left corner, its canonical centre and its
//! boundary polygon. Square grids are implemented here; other grid variants
//! plug in through [`GridGeometry`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Map coordinates have their origin at the canvas top-left with y growing
/// down; the bevy world is y-up.
pub fn world_to_map(world: Vec2) -> Vec2 {
    Vec2::new(world.x, -world.y)
}

pub fn map_to_world(map: Vec2) -> Vec2 {
    Vec2::new(map.x, -map.y)
}

/// Closed boundary of a single grid cell, in map coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CellPolygon {
    pub points: Vec<Vec2>,
}

impl CellPolygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Even-odd containment test (ray cast towards +x).
    pub fn contains(&self, point: Vec2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        self.points.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        )
    }
}

/// Grid capability: locate the cell containing a point.
pub trait GridGeometry {
    /// Top-left corner of the cell containing `point`
    fn top_left_of(&self, point: Vec2) -> Vec2;

    /// Canonical centre of the cell containing `point`
    fn center_of(&self, point: Vec2) -> Vec2;

    /// Boundary polygon of the cell containing `point`
    fn polygon_of(&self, point: Vec2) -> CellPolygon;

    /// Cell size in map units (pixels)
    fn cell_size(&self) -> f32;

    /// Grid distance units covered by one cell (e.g. 5 feet)
    fn distance(&self) -> f32;
}

/// Square grid with origin at the map's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquareGrid {
    pub size: f32,
    #[serde(default = "default_grid_distance")]
    pub distance: f32,
}

fn default_grid_distance() -> f32 {
    5.0
}

impl Default for SquareGrid {
    fn default() -> Self {
        Self {
            size: 70.0,
            distance: default_grid_distance(),
        }
    }
}

impl SquareGrid {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            ..default()
        }
    }

    /// Grid indices of the cell containing `point`
    pub fn cell_of(&self, point: Vec2) -> (i32, i32) {
        (
            (point.x / self.size).floor() as i32,
            (point.y / self.size).floor() as i32,
        )
    }
}

impl GridGeometry for SquareGrid {
    fn top_left_of(&self, point: Vec2) -> Vec2 {
        let (cx, cy) = self.cell_of(point);
        Vec2::new(cx as f32 * self.size, cy as f32 * self.size)
    }

    fn center_of(&self, point: Vec2) -> Vec2 {
        self.top_left_of(point) + Vec2::splat(self.size / 2.0)
    }

    fn polygon_of(&self, point: Vec2) -> CellPolygon {
        let tl = self.top_left_of(point);
        let s = self.size;
        CellPolygon::new(vec![
            tl,
            tl + Vec2::new(s, 0.0),
            tl + Vec2::new(s, s),
            tl + Vec2::new(0.0, s),
        ])
    }

    fn cell_size(&self) -> f32 {
        self.size
    }

    fn distance(&self) -> f32 {
        self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_map_flip() {
        let world = Vec2::new(120.0, -340.0);
        assert_eq!(world_to_map(world), Vec2::new(120.0, 340.0));
        assert_eq!(map_to_world(world_to_map(world)), world);
    }

    #[test]
    fn test_cell_of() {
        let grid = SquareGrid::new(70.0);

        assert_eq!(grid.cell_of(Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(grid.cell_of(Vec2::new(69.9, 69.9)), (0, 0));
        assert_eq!(grid.cell_of(Vec2::new(70.0, 0.0)), (1, 0));

        // Negative coordinates
        assert_eq!(grid.cell_of(Vec2::new(-1.0, -1.0)), (-1, -1));
        assert_eq!(grid.cell_of(Vec2::new(-70.0, 0.0)), (-1, 0));
    }

    #[test]
    fn test_center_of() {
        let grid = SquareGrid::new(50.0);
        assert_eq!(grid.center_of(Vec2::new(10.0, 10.0)), Vec2::new(25.0, 25.0));
        assert_eq!(grid.center_of(Vec2::new(60.0, 10.0)), Vec2::new(75.0, 25.0));
        assert_eq!(grid.center_of(Vec2::new(-10.0, -10.0)), Vec2::new(-25.0, -25.0));
    }

    #[test]
    fn test_positions_in_same_cell_share_center() {
        let grid = SquareGrid::new(70.0);
        let center = Vec2::new(35.0, 35.0);

        for pos in [
            Vec2::new(1.0, 1.0),
            Vec2::new(35.0, 35.0),
            Vec2::new(69.0, 69.0),
            Vec2::new(0.0, 69.0),
        ] {
            assert_eq!(grid.center_of(pos), center, "{:?} should map to {:?}", pos, center);
        }
    }

    #[test]
    fn test_polygon_contains_own_center() {
        let grid = SquareGrid::new(50.0);
        let p = Vec2::new(120.0, 30.0);
        let poly = grid.polygon_of(p);
        assert!(poly.contains(grid.center_of(p)));
        assert!(poly.contains(p));
        assert!(!poly.contains(Vec2::new(10.0, 10.0)));
        assert!(!poly.contains(Vec2::new(175.0, 25.0)));
    }

    #[test]
    fn test_polygon_bounds() {
        let grid = SquareGrid::new(50.0);
        let (min, max) = grid.polygon_of(Vec2::new(60.0, 110.0)).bounds();
        assert_eq!(min, Vec2::new(50.0, 100.0));
        assert_eq!(max, Vec2::new(100.0, 150.0));
    }

    #[test]
    fn test_triangle_contains() {
        let tri = CellPolygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
        ]);
        assert!(tri.contains(Vec2::new(2.0, 2.0)));
        assert!(!tri.contains(Vec2::new(8.0, 8.0)));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = CellPolygon::new(vec![Vec2::ZERO, Vec2::new(10.0, 10.0)]);
        assert!(!line.contains(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_grid_default_distance_when_missing() {
        let grid: SquareGrid = serde_json::from_str(r#"{"size": 100.0}"#).unwrap();
        assert_eq!(grid.size, 100.0);
        assert_eq!(grid.distance, 5.0);
    }
}
