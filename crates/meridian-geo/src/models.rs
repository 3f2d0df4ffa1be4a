//! Geometry models for meridian-geo.
//!
//! This module re-exports canonical types from `meridian-core` and provides
//! the conversions between the native model and the `geo` crate.

use geo::Geometry as GeoGeometry;

// Re-export canonical types from meridian-core
pub use meridian_core::models::{
    close_ring, is_closed, Coordinate, Crs, Distance, DistanceUnit, Ellipsoid, Extent, Feature,
    Geometry, GeometryType, InterpolationConfig, InterpolationContext, InterpolationMethod, Layout,
    Ring, Shape, DEFAULT_SPACING_METERS, EPSILON,
};

pub fn coord_to_geo(c: &Coordinate) -> geo::Coord<f64> {
    geo::Coord { x: c.x, y: c.y }
}

pub fn coords_to_line(coords: &[Coordinate]) -> geo::LineString<f64> {
    geo::LineString::new(coords.iter().map(coord_to_geo).collect())
}

pub fn rings_to_polygon(rings: &[Ring]) -> geo::Polygon<f64> {
    match rings.split_first() {
        Some((exterior, interiors)) => {
            geo::Polygon::new(coords_to_line(exterior), interiors.iter().map(|r| coords_to_line(r)).collect())
        }
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

pub fn line_to_coords(line: &geo::LineString<f64>) -> Vec<Coordinate> {
    line.coords().map(|c| Coordinate::new(c.x, c.y)).collect()
}

pub fn polygon_to_rings(polygon: &geo::Polygon<f64>) -> Vec<Ring> {
    let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
    if !polygon.exterior().0.is_empty() {
        rings.push(line_to_coords(polygon.exterior()));
    }
    for interior in polygon.interiors() {
        rings.push(line_to_coords(interior));
    }
    rings
}

/// Convert a canonical Geometry to a geo::Geometry. Only x and y survive.
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry<f64> {
    match &geom.shape {
        Shape::Point(c) => GeoGeometry::Point(geo::Point::new(c.x, c.y)),
        Shape::MultiPoint(coords) => GeoGeometry::MultiPoint(geo::MultiPoint::new(
            coords.iter().map(|c| geo::Point::new(c.x, c.y)).collect(),
        )),
        Shape::LineString(coords) | Shape::LinearRing(coords) => {
            GeoGeometry::LineString(coords_to_line(coords))
        }
        Shape::Polygon(rings) => GeoGeometry::Polygon(rings_to_polygon(rings)),
        Shape::MultiLineString(lines) => GeoGeometry::MultiLineString(geo::MultiLineString::new(
            lines.iter().map(|l| coords_to_line(l)).collect(),
        )),
        Shape::MultiPolygon(polygons) => GeoGeometry::MultiPolygon(geo::MultiPolygon::new(
            polygons.iter().map(|p| rings_to_polygon(p)).collect(),
        )),
        Shape::GeometryCollection(members) => GeoGeometry::GeometryCollection(
            geo::GeometryCollection(members.iter().map(to_geo_geometry).collect()),
        ),
    }
}

/// Convert a geo::Geometry to a canonical Geometry
pub fn from_geo_geometry(geom: &GeoGeometry<f64>) -> Geometry {
    let shape = match geom {
        GeoGeometry::Point(p) => Shape::Point(Coordinate::new(p.x(), p.y())),
        GeoGeometry::Line(l) => Shape::LineString(vec![
            Coordinate::new(l.start.x, l.start.y),
            Coordinate::new(l.end.x, l.end.y),
        ]),
        GeoGeometry::LineString(ls) => Shape::LineString(line_to_coords(ls)),
        GeoGeometry::Polygon(p) => Shape::Polygon(polygon_to_rings(p)),
        GeoGeometry::MultiPoint(mp) => {
            Shape::MultiPoint(mp.iter().map(|p| Coordinate::new(p.x(), p.y())).collect())
        }
        GeoGeometry::MultiLineString(mls) => {
            Shape::MultiLineString(mls.iter().map(line_to_coords).collect())
        }
        GeoGeometry::MultiPolygon(mp) => Shape::MultiPolygon(mp.iter().map(polygon_to_rings).collect()),
        GeoGeometry::GeometryCollection(gc) => {
            Shape::GeometryCollection(gc.iter().map(from_geo_geometry).collect())
        }
        GeoGeometry::Rect(r) => Shape::Polygon(polygon_to_rings(&r.to_polygon())),
        GeoGeometry::Triangle(t) => Shape::Polygon(polygon_to_rings(&t.to_polygon())),
    };
    Geometry::new(shape)
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry<f64>;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry<f64> {
        to_geo_geometry(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_roundtrip() {
        let geom = Geometry::point(115.0, -8.5);
        let back = from_geo_geometry(&to_geo_geometry(&geom));
        assert_eq!(back, geom);
    }

    #[test]
    fn test_polygon_with_hole() {
        let geom = Geometry::polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 2.0]],
        ]);
        let back = from_geo_geometry(&to_geo_geometry(&geom));
        match back.shape {
            Shape::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                assert_eq!(rings[1].len(), 4);
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_ring_becomes_line() {
        let ring = Geometry::linear_ring(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(matches!(ring.to_geo(), GeoGeometry::LineString(_)));
    }
}
