//! Splitting wide shapes into zone-sized cells before buffering.
//!
//! A planar frame stays within buffer tolerance over roughly one UTM zone,
//! so larger shapes are cut into cells, buffered cell by cell and merged.
//! Inward buffers need overlapping cells: each piece is cut from a cell
//! grown by half the overlap on every side, buffered, and clipped back to
//! its core cell so the artificial cut edges never erode the result.

use crate::models::Extent;
use geo::{coord, BooleanOps, Destination, Geodesic, MultiLineString, MultiPolygon, Point, Polygon, Rect, Rhumb};
use meridian_core::error::{MeridianError, Result};

/// Longitude width of a UTM zone, the largest cell buffered in one frame.
pub const UTM_ZONE_WIDTH: f64 = 6.0;

/// Overlap between inward cells, as a multiple of the buffer distance.
pub const INWARD_OFFSET_FACTOR: f64 = 2.05;

/// Longitude overlap needed between inward cells.
///
/// Measured at the pole-ward edge of `extent`, where a degree of longitude
/// is shortest: step `distance` toward the equator along the meridian, then
/// run east along a rhumb line for [`INWARD_OFFSET_FACTOR`] times the
/// distance. `None` when that walk wraps past a full turn.
pub fn inward_lon_offset(extent: &Extent, distance: f64) -> Option<f64> {
    let d = distance.abs();
    let (edge, toward_equator) = if extent.max_y.abs() >= extent.min_y.abs() {
        (extent.max_y, if extent.max_y >= 0.0 { 180.0 } else { 0.0 })
    } else {
        (extent.min_y, if extent.min_y >= 0.0 { 180.0 } else { 0.0 })
    };
    let inner = Geodesic.destination(Point::new(0.0, edge.clamp(-90.0, 90.0)), toward_equator, d);
    let cos_lat = inner.y().to_radians().cos();
    if cos_lat <= f64::EPSILON {
        return None;
    }
    // Rough sphere estimate first; the rhumb destination wraps past 360°.
    let estimate = (INWARD_OFFSET_FACTOR * d / (6_371_008.8 * cos_lat)).to_degrees();
    if estimate >= 180.0 {
        return None;
    }
    let start = Point::new(-180.0, inner.y());
    let end = Rhumb.destination(start, 90.0, INWARD_OFFSET_FACTOR * d);
    Some(end.x() + 180.0)
}

/// Latitude overlap needed between inward cells.
pub fn inward_lat_offset(distance: f64) -> f64 {
    let p = Geodesic.destination(Point::new(0.0, 0.0), 0.0, INWARD_OFFSET_FACTOR * distance.abs());
    p.y()
}

/// A grid of cells covering an extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub origin: (f64, f64),
    pub step: (f64, f64),
    pub overlap: (f64, f64),
    pub columns: usize,
    pub rows: usize,
}

/// One grid cell: the part it owns, and the part it is cut from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub core: Rect<f64>,
    pub expanded: Rect<f64>,
}

impl Grid {
    fn len(&self) -> usize {
        self.columns * self.rows
    }

    /// Whether pieces must be clipped back to their core cell.
    pub fn clips_back(&self) -> bool {
        self.overlap.0 > 0.0 || self.overlap.1 > 0.0
    }

    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.len());
        for row in 0..self.rows {
            for column in 0..self.columns {
                let x0 = self.origin.0 + column as f64 * self.step.0;
                let y0 = self.origin.1 + row as f64 * self.step.1;
                let (hx, hy) = (self.overlap.0 / 2.0, self.overlap.1 / 2.0);
                cells.push(Cell {
                    core: rect(x0, y0, x0 + self.step.0, y0 + self.step.1),
                    expanded: rect(x0 - hx, y0 - hy, x0 + self.step.0 + hx, y0 + self.step.1 + hy),
                });
            }
        }
        cells
    }
}

fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect<f64> {
    Rect::new(
        coord! { x: min_x, y: min_y.max(-90.0) },
        coord! { x: max_x, y: max_y.min(90.0) },
    )
}

/// How a shape is buffered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitPlan {
    /// One frame centered on the extent.
    Direct,
    /// Cell by cell, then merged.
    Grid(Grid),
}

fn cells_along(span: f64, step: f64) -> usize {
    ((span / step).ceil() as usize).max(1)
}

/// Choose a plan for buffering a lon/lat shape with `extent` by `distance`.
///
/// Shapes within one zone in both directions are buffered directly. Wider
/// outward buffers use plain zone cells. Inward buffers shrink the cell by
/// the overlap and fail when nothing is left or the longitude boxes would
/// number more than `max_boxes`.
pub fn plan(extent: &Extent, distance: f64, max_boxes: usize) -> Result<SplitPlan> {
    if extent.width() <= UTM_ZONE_WIDTH && extent.height() <= UTM_ZONE_WIDTH {
        return Ok(SplitPlan::Direct);
    }

    let (step, overlap) = if distance >= 0.0 {
        ((UTM_ZONE_WIDTH, UTM_ZONE_WIDTH), (0.0, 0.0))
    } else {
        let lon_offset = inward_lon_offset(extent, distance).ok_or_else(|| MeridianError::CannotSplit {
            reason: "inward offset wraps the globe at this latitude".to_string(),
        })?;
        let lat_offset = inward_lat_offset(distance);
        let step = (UTM_ZONE_WIDTH - lon_offset, UTM_ZONE_WIDTH - lat_offset);
        if step.0 <= 0.0 || step.1 <= 0.0 {
            return Err(MeridianError::CannotSplit {
                reason: format!("inward offset of {:.3}° leaves no usable cell width", lon_offset),
            });
        }
        let boxes = cells_along(extent.width(), step.0);
        if boxes > max_boxes {
            return Err(MeridianError::CannotSplit {
                reason: format!("{} boxes exceed the limit of {}", boxes, max_boxes),
            });
        }
        (step, (lon_offset, lat_offset))
    };

    Ok(SplitPlan::Grid(Grid {
        origin: (extent.min_x, extent.min_y),
        step,
        overlap,
        columns: cells_along(extent.width(), step.0),
        rows: cells_along(extent.height(), step.1),
    }))
}

/// Part of `polygons` inside `cell`.
pub fn clip_polygons(polygons: &MultiPolygon<f64>, cell: &Rect<f64>) -> MultiPolygon<f64> {
    let window: Polygon<f64> = cell.to_polygon();
    polygons.intersection(&MultiPolygon::new(vec![window]))
}

/// Part of `lines` inside `cell`.
pub fn clip_lines(lines: &MultiLineString<f64>, cell: &Rect<f64>) -> MultiLineString<f64> {
    cell.to_polygon().clip(lines, false)
}
