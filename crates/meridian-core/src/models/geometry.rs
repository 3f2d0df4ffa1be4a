//! Native geometry model consumed and produced by the engine.
//!
//! Coordinates always carry four components; the owning geometry's [`Layout`]
//! says which of `z`/`m` are meaningful. Geometries also carry the two flags
//! the engine consumes: `normalized` (antimeridian processing already applied)
//! and an optional interpolation-method override.

use super::extent::Extent;
use super::interpolation::InterpolationMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Angular tolerance, in degrees, used for closure and equality checks.
pub const EPSILON: f64 = 1e-12;

/// A single position. `x`/`y` are longitude/latitude in EPSG:4326 or
/// easting/northing in a projected CRS.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub m: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0, m: 0.0 }
    }

    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, m: 0.0 }
    }

    pub const fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self { x, y, z, m }
    }

    /// Build from a flat slice interpreted with `layout`.
    pub fn from_slice(values: &[f64], layout: Layout) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let mut coord = Coordinate::new(values[0], values[1]);
        match layout {
            Layout::XY => {}
            Layout::XYZ => coord.z = values.get(2).copied().unwrap_or(0.0),
            Layout::XYM => coord.m = values.get(2).copied().unwrap_or(0.0),
            Layout::XYZM => {
                coord.z = values.get(2).copied().unwrap_or(0.0);
                coord.m = values.get(3).copied().unwrap_or(0.0);
            }
        }
        Some(coord)
    }

    /// Flatten to `layout.stride()` values.
    pub fn to_vec(&self, layout: Layout) -> Vec<f64> {
        match layout {
            Layout::XY => vec![self.x, self.y],
            Layout::XYZ => vec![self.x, self.y, self.z],
            Layout::XYM => vec![self.x, self.y, self.m],
            Layout::XYZM => vec![self.x, self.y, self.z, self.m],
        }
    }

    /// Copy with a replaced x component, keeping z and m.
    pub fn with_x(&self, x: f64) -> Self {
        Self { x, ..*self }
    }

    /// Copy with replaced x/y components, keeping z and m.
    pub fn with_xy(&self, x: f64, y: f64) -> Self {
        Self { x, y, ..*self }
    }

    /// Planar equality within [`EPSILON`].
    pub fn approx_eq(&self, other: &Coordinate) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }

    /// Linear interpolation of every component at `fraction` in `[0, 1]`.
    pub fn lerp(&self, other: &Coordinate, fraction: f64) -> Coordinate {
        Coordinate {
            x: self.x + (other.x - self.x) * fraction,
            y: self.y + (other.y - self.y) * fraction,
            z: self.z + (other.z - self.z) * fraction,
            m: self.m + (other.m - self.m) * fraction,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Coordinate::new(value[0], value[1])
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(value: (f64, f64)) -> Self {
        Coordinate::new(value.0, value.1)
    }
}

/// Coordinate stride of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    XY,
    XYZ,
    XYM,
    XYZM,
}

impl Layout {
    pub fn stride(&self) -> usize {
        match self {
            Layout::XY => 2,
            Layout::XYZ | Layout::XYM => 3,
            Layout::XYZM => 4,
        }
    }

    /// Layout for a raw stride; a stride of 3 is read as XYZ.
    pub fn from_stride(stride: usize) -> Option<Self> {
        match stride {
            2 => Some(Layout::XY),
            3 => Some(Layout::XYZ),
            4 => Some(Layout::XYZM),
            _ => None,
        }
    }
}

/// Closed ordered sequence of coordinates.
pub type Ring = Vec<Coordinate>;

/// A ring is closed when its first and last coordinates agree within
/// [`EPSILON`].
pub fn is_closed(coords: &[Coordinate]) -> bool {
    match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() > 1 => first.approx_eq(last),
        _ => false,
    }
}

/// Append the first coordinate if the ring is open.
pub fn close_ring(ring: &mut Ring) {
    if let Some(first) = ring.first().copied() {
        if !is_closed(ring) {
            ring.push(first);
        }
    }
}

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    LinearRing,
    Polygon,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::LinearRing => "LinearRing",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        };
        f.write_str(name)
    }
}

/// Coordinate structure of a geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Point(Coordinate),
    MultiPoint(Vec<Coordinate>),
    LineString(Vec<Coordinate>),
    LinearRing(Ring),
    Polygon(Vec<Ring>),
    MultiLineString(Vec<Vec<Coordinate>>),
    MultiPolygon(Vec<Vec<Ring>>),
    GeometryCollection(Vec<Geometry>),
}

/// A geometry together with its layout and the flags the engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub shape: Shape,
    #[serde(default)]
    pub layout: Layout,
    /// Already antimeridian-adjusted; must not be renormalized.
    #[serde(default)]
    pub normalized: bool,
    /// Per-geometry interpolation override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<InterpolationMethod>,
}

fn xy(coords: Vec<[f64; 2]>) -> Vec<Coordinate> {
    coords.into_iter().map(Coordinate::from).collect()
}

impl Geometry {
    pub fn new(shape: Shape) -> Self {
        Self { shape, layout: Layout::XY, normalized: false, interpolation: None }
    }

    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Shape::Point(Coordinate::new(x, y)))
    }

    /// Create a LineString geometry
    pub fn line_string(coords: Vec<[f64; 2]>) -> Self {
        Self::new(Shape::LineString(xy(coords)))
    }

    /// Create a LinearRing geometry
    pub fn linear_ring(coords: Vec<[f64; 2]>) -> Self {
        Self::new(Shape::LinearRing(xy(coords)))
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Self::new(Shape::Polygon(rings.into_iter().map(xy).collect()))
    }

    pub fn multi_point(coords: Vec<[f64; 2]>) -> Self {
        Self::new(Shape::MultiPoint(xy(coords)))
    }

    pub fn multi_line_string(lines: Vec<Vec<[f64; 2]>>) -> Self {
        Self::new(Shape::MultiLineString(lines.into_iter().map(xy).collect()))
    }

    pub fn multi_polygon(polygons: Vec<Vec<Vec<[f64; 2]>>>) -> Self {
        Self::new(Shape::MultiPolygon(
            polygons.into_iter().map(|rings| rings.into_iter().map(xy).collect()).collect(),
        ))
    }

    pub fn collection(members: Vec<Geometry>) -> Self {
        Self::new(Shape::GeometryCollection(members))
    }

    pub fn with_interpolation(mut self, method: InterpolationMethod) -> Self {
        self.interpolation = Some(method);
        self
    }

    /// Mark as already antimeridian-adjusted.
    pub fn mark_normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    /// Keep layout and flags from `self` but swap the coordinate structure.
    pub fn with_shape(&self, shape: Shape) -> Self {
        Self { shape, layout: self.layout, normalized: self.normalized, interpolation: self.interpolation }
    }

    /// Get the geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match &self.shape {
            Shape::Point(_) => GeometryType::Point,
            Shape::MultiPoint(_) => GeometryType::MultiPoint,
            Shape::LineString(_) => GeometryType::LineString,
            Shape::LinearRing(_) => GeometryType::LinearRing,
            Shape::Polygon(_) => GeometryType::Polygon,
            Shape::MultiLineString(_) => GeometryType::MultiLineString,
            Shape::MultiPolygon(_) => GeometryType::MultiPolygon,
            Shape::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    /// Point and MultiPoint carry no segments.
    pub fn is_point_like(&self) -> bool {
        matches!(self.shape, Shape::Point(_) | Shape::MultiPoint(_))
    }

    pub fn is_empty(&self) -> bool {
        match &self.shape {
            Shape::Point(c) => !c.is_finite(),
            Shape::MultiPoint(coords) | Shape::LineString(coords) | Shape::LinearRing(coords) => {
                coords.is_empty()
            }
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter().all(|ring| ring.is_empty())
            }
            Shape::MultiPolygon(polygons) => {
                polygons.iter().all(|rings| rings.iter().all(|ring| ring.is_empty()))
            }
            Shape::GeometryCollection(members) => members.iter().all(Geometry::is_empty),
        }
    }

    /// Visit every coordinate.
    pub fn for_each_coord<F: FnMut(&Coordinate)>(&self, f: &mut F) {
        match &self.shape {
            Shape::Point(c) => f(c),
            Shape::MultiPoint(coords) | Shape::LineString(coords) | Shape::LinearRing(coords) => {
                coords.iter().for_each(|c| f(c))
            }
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter().flatten().for_each(|c| f(c))
            }
            Shape::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().for_each(|c| f(c))
            }
            Shape::GeometryCollection(members) => {
                members.iter().for_each(|member| member.for_each_coord(f))
            }
        }
    }

    /// Visit every coordinate mutably.
    pub fn for_each_coord_mut<F: FnMut(&mut Coordinate)>(&mut self, f: &mut F) {
        match &mut self.shape {
            Shape::Point(c) => f(c),
            Shape::MultiPoint(coords) | Shape::LineString(coords) | Shape::LinearRing(coords) => {
                coords.iter_mut().for_each(|c| f(c))
            }
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter_mut().flatten().for_each(|c| f(c))
            }
            Shape::MultiPolygon(polygons) => {
                polygons.iter_mut().flatten().flatten().for_each(|c| f(c))
            }
            Shape::GeometryCollection(members) => {
                members.iter_mut().for_each(|member| member.for_each_coord_mut(f))
            }
        }
    }

    pub fn coord_count(&self) -> usize {
        let mut count = 0;
        self.for_each_coord(&mut |_| count += 1);
        count
    }

    /// Bounding extent of all coordinates.
    pub fn extent(&self) -> Extent {
        let mut extent = Extent::empty();
        self.for_each_coord(&mut |c| extent.extend(c));
        extent
    }
}

/// A feature: an optional geometry plus the side field that keeps the
/// geometry as it was before interpolation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry: Some(geometry), ..Default::default() }
    }
}
