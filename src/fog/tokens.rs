//! Observer tokens: placed tokens that grant vision around themselves.

use bevy::prelude::*;

use crate::map::GridGeometry;

/// Snapshot of a placed token, in map coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedToken {
    pub center: Vec2,
    /// Token footprint width in map units
    pub width: f32,
    /// Whether this token grants vision
    pub observer: bool,
}

impl PlacedToken {
    pub fn observer(center: Vec2, width: f32) -> Self {
        Self {
            center,
            width,
            observer: true,
        }
    }

    /// Convert a radius in grid units into map units measured from the
    /// token centre (the radius starts at the token's edge).
    pub fn light_radius<G: GridGeometry + ?Sized>(&self, base_radius: f32, grid: &G) -> f32 {
        if base_radius == 0.0 {
            return 0.0;
        }
        let distance = grid.distance();
        if distance <= 0.0 {
            return 0.0;
        }
        let units = base_radius.abs() / distance * grid.cell_size() + self.width / 2.0;
        units * base_radius.signum()
    }
}

/// Token query capability
pub trait TokenQuery {
    fn tokens(&self) -> Vec<PlacedToken>;

    fn observers(&self) -> Vec<PlacedToken> {
        self.tokens().into_iter().filter(|t| t.observer).collect()
    }
}

impl TokenQuery for [PlacedToken] {
    fn tokens(&self) -> Vec<PlacedToken> {
        self.to_vec()
    }
}

impl TokenQuery for Vec<PlacedToken> {
    fn tokens(&self) -> Vec<PlacedToken> {
        self.clone()
    }
}

/// Marker component for tokens placed on the map by the host
#[derive(Component, Debug, Clone, Copy)]
pub struct ObserverToken {
    pub width: f32,
    pub observer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::SquareGrid;

    #[test]
    fn test_light_radius_zero_stays_zero() {
        let token = PlacedToken::observer(Vec2::ZERO, 50.0);
        assert_eq!(token.light_radius(0.0, &SquareGrid::new(50.0)), 0.0);
    }

    #[test]
    fn test_light_radius_grid_units_to_map_units() {
        // 30 ft on a 50px / 5ft grid = 300px, plus half the token width
        let token = PlacedToken::observer(Vec2::ZERO, 50.0);
        let grid = SquareGrid::new(50.0);
        assert_eq!(token.light_radius(30.0, &grid), 325.0);
    }

    #[test]
    fn test_observers_filters_non_observers() {
        let tokens = vec![
            PlacedToken::observer(Vec2::new(10.0, 10.0), 50.0),
            PlacedToken {
                center: Vec2::new(90.0, 90.0),
                width: 50.0,
                observer: false,
            },
        ];
        let observers = tokens.observers();
        assert_eq!(observers.len(), 1);
        assert_eq!(observers[0].center, Vec2::new(10.0, 10.0));
    }
}
