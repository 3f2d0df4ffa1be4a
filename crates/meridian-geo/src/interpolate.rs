//! Densification of lines and rings along geodesic or rhumb paths.
//!
//! Every call takes its [`InterpolationConfig`] explicitly. A geometry's own
//! `interpolation` override replaces the configured method for that geometry.

use crate::extent::normalize_longitude_to_center;
use crate::models::{Coordinate, Feature, Geometry, InterpolationConfig, InterpolationMethod, Shape};
use crate::transform::Projection;
use geo::{Distance, Geodesic, InterpolatePoint, Point, Rhumb};
use meridian_core::error::Result;

fn path_distance(method: InterpolationMethod, a: Point<f64>, b: Point<f64>) -> f64 {
    match method {
        InterpolationMethod::Rhumb => Rhumb.distance(a, b),
        _ => Geodesic.distance(a, b),
    }
}

fn path_point(method: InterpolationMethod, a: Point<f64>, b: Point<f64>, fraction: f64) -> Point<f64> {
    match method {
        InterpolationMethod::Rhumb => Rhumb.point_at_ratio_between(a, b, fraction),
        _ => Geodesic.point_at_ratio_between(a, b, fraction),
    }
}

/// Insert vertices so that consecutive points of `coords` are no more than
/// `config.spacing` meters apart along the configured path.
///
/// Coordinates are in `projection`'s CRS; the path is computed in lon/lat.
/// Inserted longitudes stay within 180° of the segment start, so a segment
/// crossing the antimeridian keeps increasing past 180 rather than jumping.
pub fn interpolate_line(
    coords: &mut Vec<Coordinate>,
    config: &InterpolationConfig,
    projection: &dyn Projection,
) -> Result<()> {
    if config.method == InterpolationMethod::None || coords.len() < 2 || config.spacing <= 0.0 {
        return Ok(());
    }

    // Walk backwards so insertions never shift a pair not yet visited.
    for i in (0..coords.len() - 1).rev() {
        let start = projection.to_lon_lat(&coords[i])?;
        let end = projection.to_lon_lat(&coords[i + 1])?;
        let a = Point::new(start.x, start.y);
        let b = Point::new(normalize_longitude_to_center(end.x, start.x), end.y);

        let distance = path_distance(config.method, a, b);
        let count = 1 + (distance / config.spacing).ceil() as usize;
        if count <= 2 {
            continue;
        }

        let mut inserted = Vec::with_capacity(count - 2);
        for k in 1..count - 1 {
            let fraction = k as f64 / (count - 1) as f64;
            let p = path_point(config.method, a, b, fraction);
            let linear = coords[i].lerp(&coords[i + 1], fraction);
            let lon_lat = Coordinate {
                x: normalize_longitude_to_center(p.x(), start.x),
                y: p.y(),
                z: linear.z,
                m: linear.m,
            };
            inserted.push(projection.from_lon_lat(&lon_lat)?);
        }
        coords.splice(i + 1..i + 1, inserted);
    }
    Ok(())
}

/// Interpolate every line and ring of `geometry` in place. Points are left
/// alone; collection members resolve their own overrides.
pub fn interpolate_geometry(
    geometry: &mut Geometry,
    config: &InterpolationConfig,
    projection: &dyn Projection,
) -> Result<()> {
    let effective = config.resolve(geometry.interpolation);
    match &mut geometry.shape {
        Shape::Point(_) | Shape::MultiPoint(_) => Ok(()),
        Shape::LineString(coords) | Shape::LinearRing(coords) => {
            interpolate_line(coords, &effective, projection)
        }
        Shape::Polygon(lines) | Shape::MultiLineString(lines) => lines
            .iter_mut()
            .try_for_each(|line| interpolate_line(line, &effective, projection)),
        Shape::MultiPolygon(polygons) => polygons
            .iter_mut()
            .flatten()
            .try_for_each(|ring| interpolate_line(ring, &effective, projection)),
        Shape::GeometryCollection(members) => members
            .iter_mut()
            .try_for_each(|member| interpolate_geometry(member, config, projection)),
    }
}

/// Interpolate a feature's geometry, keeping the undensified geometry in
/// `original_geometry`. A feature interpolated before is redone from that
/// stored original, so density changes do not compound.
pub fn interpolate_feature(
    feature: &mut Feature,
    config: &InterpolationConfig,
    projection: &dyn Projection,
) -> Result<()> {
    let source = match (&feature.original_geometry, &feature.geometry) {
        (Some(original), _) => original.clone(),
        (None, Some(geometry)) => geometry.clone(),
        (None, None) => return Ok(()),
    };
    if source.is_point_like() || config.resolve(source.interpolation).method == InterpolationMethod::None {
        return Ok(());
    }

    let mut densified = source.clone();
    interpolate_geometry(&mut densified, config, projection)?;
    feature.original_geometry.get_or_insert(source);
    feature.geometry = Some(densified);
    Ok(())
}
