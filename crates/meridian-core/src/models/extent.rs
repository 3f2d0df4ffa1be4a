//! Axis-aligned extents.

use super::geometry::Coordinate;
use serde::{Deserialize, Serialize};

/// `[min_x, min_y, max_x, max_y]`. The empty extent is inverted infinity so
/// that extending it with any coordinate yields that coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self::empty()
    }
}

impl Extent {
    /// The EPSG:4326 world.
    pub const WORLD: Extent = Extent { min_x: -180.0, min_y: -90.0, max_x: 180.0, max_y: 90.0 };

    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub const fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coordinate>) -> Self {
        let mut extent = Self::empty();
        for coord in coords {
            extent.extend(coord);
        }
        extent
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    pub fn extend(&mut self, coord: &Coordinate) {
        self.min_x = self.min_x.min(coord.x);
        self.min_y = self.min_y.min(coord.y);
        self.max_x = self.max_x.max(coord.x);
        self.max_y = self.max_y.max(coord.y);
    }

    pub fn merge(&self, other: &Extent) -> Extent {
        Extent::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Translate along x by `dx`.
    pub fn shift_x(&self, dx: f64) -> Extent {
        Extent::new(self.min_x + dx, self.min_y, self.max_x + dx, self.max_y)
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.x >= self.min_x && coord.x <= self.max_x && coord.y >= self.min_y && coord.y <= self.max_y
    }
}
