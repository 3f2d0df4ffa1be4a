//! Antimeridian handling for geographic (EPSG:4326) geometry: crossing
//! detection, splitting lines into segments that each stay on one side,
//! merging them back, and cutting or pole-capping polygons.

use crate::extent::{normalize_longitude, normalize_longitude_to_center, wrap_longitude, WORLD_WIDTH};
use crate::models::{close_ring, Coordinate, Geometry, Ring, Shape, EPSILON};
use crate::models::{polygon_to_rings, rings_to_polygon};
use crate::topology::guard;
use geo::{BooleanOps, MultiPolygon, Rect};
use tracing::warn;

/// Distance from ±180 within which a longitude counts as on the date line.
const DATE_LINE_SNAP: f64 = 1e-6;

pub use crate::extent::{
    crosses_antimeridian, normalize, normalize_anti_left, normalize_anti_right, normalize_to_center,
};

fn wrapped(coords: &[Coordinate]) -> Vec<Coordinate> {
    coords.iter().map(|c| c.with_x(wrap_longitude(c.x))).collect()
}

fn line_crosses(coords: &[Coordinate]) -> bool {
    wrapped(coords).windows(2).any(|w| (w[1].x - w[0].x).abs() > 180.0)
}

/// Whether the geometry has a segment spanning the date line. Points never
/// cross; multi-geometries cross when any member does. Geometry already
/// flagged as normalized reports false.
pub fn crosses_date_line(geometry: &Geometry) -> bool {
    if geometry.normalized {
        return false;
    }
    match &geometry.shape {
        Shape::Point(_) | Shape::MultiPoint(_) => false,
        Shape::LineString(coords) | Shape::LinearRing(coords) => line_crosses(coords),
        Shape::Polygon(rings) | Shape::MultiLineString(rings) => rings.iter().any(|r| line_crosses(r)),
        Shape::MultiPolygon(polygons) => polygons.iter().flatten().any(|r| line_crosses(r)),
        Shape::GeometryCollection(members) => members.iter().any(crosses_date_line),
    }
}

/// Split a coordinate run at each date-line jump.
///
/// Each side of a jump gets a copy of the neighbouring vertex shifted by
/// 360°, so every segment runs up to (and slightly past) ±180.
fn split_coords(coords: &[Coordinate]) -> Vec<Vec<Coordinate>> {
    let coords = wrapped(coords);
    let Some((first, rest)) = coords.split_first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = vec![*first];
    let mut previous = *first;
    for &next in rest {
        let delta = next.x - previous.x;
        if delta.abs() > 180.0 {
            let shift = if delta > 0.0 { -WORLD_WIDTH } else { WORLD_WIDTH };
            current.push(next.with_x(next.x + shift));
            segments.push(std::mem::take(&mut current));
            current.push(previous.with_x(previous.x - shift));
        }
        current.push(next);
        previous = next;
    }
    segments.push(current);
    segments
}

fn lines_shape(mut segments: Vec<Vec<Coordinate>>) -> Shape {
    if segments.len() == 1 {
        Shape::LineString(segments.remove(0))
    } else {
        Shape::MultiLineString(segments)
    }
}

/// Split lines at the date line and cut polygons into per-world pieces.
///
/// Longitudes are wrapped into ±180. A line with N jumps becomes N+1
/// segments (a MultiLineString when N > 0). The result is flagged
/// normalized and returned as-is by later calls.
pub fn split_on_date_line(geometry: &Geometry) -> Geometry {
    if geometry.normalized {
        return geometry.clone();
    }
    let shape = match &geometry.shape {
        Shape::Point(c) => Shape::Point(c.with_x(wrap_longitude(c.x))),
        Shape::MultiPoint(coords) => Shape::MultiPoint(wrapped(coords)),
        Shape::LineString(coords) | Shape::LinearRing(coords) => lines_shape(split_coords(coords)),
        Shape::MultiLineString(lines) => {
            Shape::MultiLineString(lines.iter().flat_map(|line| split_coords(line)).collect())
        }
        Shape::Polygon(rings) => {
            let pieces = split_polygon(rings);
            if pieces.len() == 1 {
                Shape::Polygon(pieces.into_iter().flatten().collect())
            } else {
                Shape::MultiPolygon(pieces)
            }
        }
        Shape::MultiPolygon(polygons) => {
            Shape::MultiPolygon(polygons.iter().flat_map(|rings| split_polygon(rings)).collect())
        }
        Shape::GeometryCollection(members) => {
            Shape::GeometryCollection(members.iter().map(split_on_date_line).collect())
        }
    };
    geometry.with_shape(shape).mark_normalized()
}

fn wraps_onto(a: &Coordinate, b: &Coordinate) -> bool {
    (a.x.abs() + b.x.abs() - WORLD_WIDTH).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON
}

/// Join the segments of a MultiLineString into one LineString, removing the
/// boundary copies inserted by [`split_on_date_line`]. Other geometry is
/// returned unchanged.
pub fn merge_line_geometry(geometry: &Geometry) -> Geometry {
    let Shape::MultiLineString(lines) = &geometry.shape else {
        return geometry.clone();
    };
    let mut segments = lines.iter().filter(|line| !line.is_empty());
    let Some(first) = segments.next() else {
        return geometry.clone();
    };

    let mut merged = first.clone();
    for next in segments {
        let n = merged.len();
        let joins_exactly = merged.last().is_some_and(|last| last.approx_eq(&next[0]));
        if joins_exactly {
            merged.extend_from_slice(&next[1..]);
        } else if n >= 2
            && next.len() >= 2
            && wraps_onto(&merged[n - 2], &next[0])
            && wraps_onto(&merged[n - 1], &next[1])
        {
            merged.pop();
            merged.extend_from_slice(&next[1..]);
        } else {
            merged.extend_from_slice(next);
        }
    }

    let mut out = geometry.with_shape(Shape::LineString(merged));
    out.normalized = false;
    out
}

/// Net change of longitude walking once around the ring, with each step
/// taken the short way. A ring around a pole winds ±360°; others 0.
fn winding(ring: &[Coordinate]) -> f64 {
    let mut total = 0.0;
    for w in ring.windows(2) {
        total += normalize_longitude(w[1].x - w[0].x, -180.0);
    }
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if !first.approx_eq(last) {
            total += normalize_longitude(first.x - last.x, -180.0);
        }
    }
    total
}

/// A ring whose longitudes wind once around the globe encloses a pole.
pub fn is_pole_capping(ring: &[Coordinate]) -> bool {
    ring.len() >= 3 && winding(ring).abs() > 180.0
}

/// Close a pole-enclosing ring into an ordinary lon/lat polygon by running
/// it along the date line to the pole and back.
///
/// The pole taken is the one on the side of the ring's mean latitude. Four
/// vertices are inserted at the crossing: `(±180, lat)`, `(±180, pole)`,
/// `(∓180, pole)`, `(∓180, lat)`. A ring that does not enclose a pole is
/// returned unchanged.
pub fn cap_pole(ring: &[Coordinate]) -> Ring {
    if !is_pole_capping(ring) {
        return ring.to_vec();
    }
    let mut open = wrapped(ring);
    if open.len() > 1 && open[0].approx_eq(&open[open.len() - 1]) {
        open.pop();
    }
    let Some(crossing) = (0..open.len()).find(|&i| {
        let next = &open[(i + 1) % open.len()];
        (next.x - open[i].x).abs() > 180.0
    }) else {
        return ring.to_vec();
    };

    // Start right after the crossing edge so it becomes the closing edge.
    let turn = (crossing + 1) % open.len();
    open.rotate_left(turn);
    let before = open[open.len() - 1];
    let after = open[0];

    let side = if before.x < 0.0 { -180.0 } else { 180.0 };
    let after_x = normalize_longitude_to_center(after.x, before.x);
    let lat = if (after_x - before.x).abs() <= EPSILON {
        before.y
    } else {
        before.y + (after.y - before.y) * (side - before.x) / (after_x - before.x)
    };
    let mean_lat = open.iter().map(|c| c.y).sum::<f64>() / open.len() as f64;
    let pole = if mean_lat >= 0.0 { 90.0 } else { -90.0 };

    let mut capped = open;
    capped.extend([
        before.with_xy(side, lat),
        before.with_xy(side, pole),
        before.with_xy(-side, pole),
        before.with_xy(-side, lat),
    ]);
    close_ring(&mut capped);
    capped
}

/// Copy of `coords` with each longitude moved within 180° of the one before
/// it, the first placed within 180° of `anchor`.
pub fn unwrap_longitudes(coords: &[Coordinate], anchor: f64) -> Vec<Coordinate> {
    let mut previous = anchor;
    coords
        .iter()
        .map(|c| {
            let x = normalize_longitude_to_center(c.x, previous);
            previous = x;
            c.with_x(x)
        })
        .collect()
}

/// Lay each ring out with continuous longitudes, the first ring starting in
/// ±180 and later rings placed near it.
pub fn unwrap_rings(rings: &[Ring]) -> Vec<Ring> {
    let anchor = rings.first().and_then(|r| r.first()).map(|c| wrap_longitude(c.x)).unwrap_or(0.0);
    rings.iter().map(|ring| unwrap_longitudes(ring, anchor)).collect()
}

/// Pin longitudes within float noise of ±180 onto the date line; clip
/// output can land a hair outside the window.
fn snap_to_date_line(x: f64) -> f64 {
    if (x.abs() - 180.0).abs() <= DATE_LINE_SNAP {
        180f64.copysign(x)
    } else {
        x
    }
}

/// Cut a polygon into pieces that each lie inside `[-180, 180]`.
fn split_polygon(rings: &[Ring]) -> Vec<Vec<Ring>> {
    let Some(exterior) = rings.first() else {
        return Vec::new();
    };
    if is_pole_capping(exterior) {
        let mut capped = vec![cap_pole(exterior)];
        capped.extend(rings[1..].iter().map(|r| wrapped(r)));
        return vec![capped];
    }
    if !rings.iter().any(|r| line_crosses(r)) {
        return vec![rings.iter().map(|r| wrapped(r)).collect()];
    }

    let unwrapped = unwrap_rings(rings);
    let polygon = rings_to_polygon(&unwrapped);
    let (min_x, max_x) = unwrapped[0]
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(c.x), hi.max(c.x)));
    let first_copy = ((min_x + 180.0) / WORLD_WIDTH).floor() as i64;
    let last_copy = ((max_x + 180.0) / WORLD_WIDTH).floor() as i64;

    let mut pieces = Vec::new();
    for copy in first_copy..=last_copy {
        let offset = copy as f64 * WORLD_WIDTH;
        let window = Rect::new(
            geo::coord! { x: -180.0 + offset, y: -90.0 },
            geo::coord! { x: 180.0 + offset, y: 90.0 },
        )
        .to_polygon();
        let clipped: MultiPolygon<f64> = match guard("intersection", || polygon.intersection(&window)) {
            Ok(clipped) => clipped,
            Err(e) => {
                warn!(error = %e, "Date line cut failed; keeping polygon unsplit");
                return vec![rings.to_vec()];
            }
        };
        for piece in clipped.iter() {
            let mut piece_rings = polygon_to_rings(piece);
            for ring in piece_rings.iter_mut() {
                for c in ring.iter_mut() {
                    c.x = snap_to_date_line(c.x - offset);
                }
            }
            pieces.push(piece_rings);
        }
    }
    pieces
}
