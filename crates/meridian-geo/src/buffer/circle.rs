//! Geodesic circles for point buffers.

use crate::antimeridian::{cap_pole, is_pole_capping};
use crate::extent::normalize_longitude_to_center;
use crate::models::{close_ring, Coordinate, Ring};
use geo::{Destination, Distance, Geodesic, Point};

/// Fewest vertices a circle is built with.
pub const MIN_CIRCLE_SEGMENTS: usize = 32;

/// Vertex count keeping the chord sag of each circle edge within
/// `tolerance_ratio` of the radius.
pub fn segments_for(tolerance_ratio: f64) -> usize {
    if !(tolerance_ratio > 0.0 && tolerance_ratio < 1.0) {
        return MIN_CIRCLE_SEGMENTS;
    }
    let n = (std::f64::consts::PI / (1.0 - tolerance_ratio).acos()).ceil() as usize;
    n.max(MIN_CIRCLE_SEGMENTS)
}

/// Ring of points at geodesic distance `radius` from `center`, counter
/// clockwise in lon/lat. Longitudes stay continuous around the center; a
/// circle enclosing a pole is capped along the date line instead.
pub fn geodesic_circle(center: &Coordinate, radius: f64, segments: usize) -> Ring {
    let origin = Point::new(center.x, center.y);
    let segments = segments.max(3);
    let mut ring: Ring = (0..segments)
        .rev()
        .map(|i| {
            let bearing = 360.0 * i as f64 / segments as f64;
            let p = Geodesic.destination(origin, bearing, radius);
            Coordinate::new(normalize_longitude_to_center(p.x(), center.x), p.y())
        })
        .collect();
    close_ring(&mut ring);

    if encloses_pole(origin, radius) && is_pole_capping(&ring) {
        return cap_pole(&ring);
    }
    ring
}

fn encloses_pole(center: Point<f64>, radius: f64) -> bool {
    let pole = Point::new(center.x(), if center.y() >= 0.0 { 90.0 } else { -90.0 });
    Geodesic.distance(center, pole) < radius
}
