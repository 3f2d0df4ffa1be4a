//! Distance-accurate buffering of geometry on the ellipsoid.
//!
//! The engine works in lon/lat. Points become geodesic circles. Everything
//! else is densified along its geodesic edges, then cut into zone-sized
//! cells (see [`split`]). Each cell is mapped to a transverse Mercator
//! frame, buffered there with `geo`'s planar buffer and mapped back. The pieces are merged and repaired through the
//! [`TopologyAdapter`]. Shapes around a pole are buffered in a polar frame.
//!
//! [`BufferEngine::buffer`] reports every failure as `None`;
//! [`BufferEngine::try_buffer`] keeps the reason.

pub mod circle;
pub mod split;

use crate::antimeridian::{cap_pole, is_pole_capping, split_on_date_line, unwrap_longitudes, unwrap_rings};
use crate::extent::wrap_longitude;
use crate::frame::{LocalFrame, ProjFrame};
use crate::interpolate::interpolate_line;
use crate::models::{coords_to_line, line_to_coords, rings_to_polygon, Coordinate, Crs, Extent, Geometry};
use crate::models::{InterpolationConfig, Ring, Shape, EPSILON};
use crate::topology::{guard, TopologyAdapter};
use crate::transform::{from_lon_lat_geometry, projection_for, to_lon_lat_geometry, Projection, Wgs84};
use geo::orient::{Direction, Orient};
use geo::{
    coord, BoundingRect, Buffer, Coord, Geometry as GeoGeometry, Intersects, LineString, MapCoords,
    MultiLineString, MultiPolygon, Polygon, Rect, Simplify,
};
use meridian_core::config::{LayeredConfig, DEFAULT_MAX_SPLIT_BOXES, DEFAULT_SIMPLIFY_RATIO};
use meridian_core::error::{MeridianError, Result};
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use split::{clip_lines, clip_polygons, SplitPlan};
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest buffer distance for non-point geometry: the geodesic width of a
/// UTM zone at the equator. Beyond it planar frames drift past tolerance.
pub const ACCURACY_LIMIT_METERS: f64 = 663_470.0;

/// Densification bounds for source edges before they enter a frame.
const MIN_DENSIFY_SPACING: f64 = 1_000.0;
const MAX_DENSIFY_SPACING: f64 = 50_000.0;

/// Longest ground length of one degree anywhere on the ellipsoid: a
/// meridian degree at the pole.
const MAX_METERS_PER_DEGREE: f64 = 111_700.0;

/// How far a vertex may sit from a cell edge and still count as on it.
const CUT_EDGE_TOLERANCE: f64 = 1e-6;

/// Tunables for [`BufferEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferOptions {
    /// Simplification tolerance as a fraction of the buffer distance.
    pub simplify_ratio: f64,
    /// Most longitude boxes a shape may be split into.
    pub max_split_boxes: usize,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            simplify_ratio: DEFAULT_SIMPLIFY_RATIO,
            max_split_boxes: DEFAULT_MAX_SPLIT_BOXES,
        }
    }
}

impl BufferOptions {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            simplify_ratio: config.simplify_ratio.value,
            max_split_boxes: config.max_split_boxes.value,
        }
    }
}

/// A piece of lon/lat geometry to buffer in its own frame, the cell it was
/// cut from and the cell it must be clipped back to afterwards.
struct Piece {
    shape: GeoGeometry<f64>,
    cut: Option<Rect<f64>>,
    core: Option<Rect<f64>>,
}

/// Buffers geometry given in a host projection.
#[derive(Debug, Clone)]
pub struct BufferEngine {
    topology: TopologyAdapter,
    projection: Arc<dyn Projection>,
    options: BufferOptions,
}

impl Default for BufferEngine {
    fn default() -> Self {
        Self::new(Arc::new(Wgs84))
    }
}

impl BufferEngine {
    pub fn new(projection: Arc<dyn Projection>) -> Self {
        Self { topology: TopologyAdapter::default(), projection, options: BufferOptions::default() }
    }

    /// Engine for the configured CRS, tolerances and split limit.
    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        let crs = Crs::new(config.crs.value, format!("EPSG:{}", config.crs.value));
        Ok(Self {
            topology: TopologyAdapter::new(config.precision_tolerance.value),
            projection: projection_for(&crs)?,
            options: BufferOptions::from_config(config),
        })
    }

    pub fn options(&self) -> &BufferOptions {
        &self.options
    }

    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    /// Buffer `geometry` by `distance` meters; negative shrinks.
    ///
    /// With `skip_transform` the input is taken as lon/lat, otherwise it is
    /// in the engine's projection and the result is returned in it too.
    /// Returns `None` for a zero distance, an inward buffer of a point or
    /// line, a distance past [`ACCURACY_LIMIT_METERS`], a shape that cannot
    /// be split, or any topology failure.
    ///
    /// The accuracy limit bounds `|distance|`, so it refuses inward buffers
    /// too. An inward cell past the limit is narrower than its own overlap
    /// and could not be split anyway.
    pub fn buffer(&self, geometry: &Geometry, distance: f64, skip_transform: bool) -> Option<Geometry> {
        match self.try_buffer(geometry, distance, skip_transform) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    error = %e,
                    geometry_type = %geometry.geometry_type(),
                    distance,
                    "Buffer failed"
                );
                None
            }
        }
    }

    /// Like [`buffer`](Self::buffer), keeping the reason a buffer was refused.
    /// `Ok(None)` means there is nothing to build.
    pub fn try_buffer(&self, geometry: &Geometry, distance: f64, skip_transform: bool) -> Result<Option<Geometry>> {
        if distance == 0.0 || !distance.is_finite() || geometry.is_empty() {
            return Ok(None);
        }
        if !geometry.is_point_like() && distance.abs() > ACCURACY_LIMIT_METERS {
            return Err(MeridianError::AccuracyLimit { distance, limit: ACCURACY_LIMIT_METERS });
        }

        let lon_lat = if skip_transform {
            geometry.clone()
        } else {
            to_lon_lat_geometry(geometry, self.projection())?
        };

        let Some(polygons) = self.buffer_lon_lat(&lon_lat, distance)? else {
            return Ok(None);
        };
        if polygons.0.is_empty() {
            debug!(distance, "Buffer collapsed the geometry");
            return Ok(None);
        }

        let merged = self.topology.validate(&self.topology.write_polygons(polygons), false);
        let extent = merged.extent();
        let result = if extent.min_x < -180.0 || extent.max_x > 180.0 {
            split_on_date_line(&merged)
        } else {
            merged
        };

        if skip_transform {
            Ok(Some(result))
        } else {
            Ok(Some(from_lon_lat_geometry(&result, self.projection())?))
        }
    }

    /// Buffer lon/lat geometry, returning lon/lat polygons.
    fn buffer_lon_lat(&self, geometry: &Geometry, distance: f64) -> Result<Option<MultiPolygon<f64>>> {
        let polygons = match &geometry.shape {
            Shape::Point(center) => {
                if distance < 0.0 {
                    return Ok(None);
                }
                MultiPolygon::new(vec![self.circle(center, distance)])
            }
            Shape::MultiPoint(centers) => {
                if distance < 0.0 {
                    return Ok(None);
                }
                let circles = centers
                    .par_iter()
                    .map(|c| MultiPolygon::new(vec![self.circle(c, distance)]))
                    .collect();
                self.topology.union_all(circles)?
            }
            Shape::LineString(coords) | Shape::LinearRing(coords) => {
                if distance < 0.0 {
                    return Ok(None);
                }
                self.buffer_lines(std::slice::from_ref(coords), distance)?
            }
            Shape::MultiLineString(lines) => {
                if distance < 0.0 {
                    return Ok(None);
                }
                self.buffer_lines(lines, distance)?
            }
            Shape::Polygon(rings) => self.buffer_polygon(rings, distance)?,
            Shape::MultiPolygon(polygons) => self.buffer_multi_polygon(polygons, distance)?,
            Shape::GeometryCollection(members) => {
                let parts = members
                    .par_iter()
                    .map(|member| self.buffer_lon_lat(member, distance))
                    .collect::<Result<Vec<_>>>()?;
                let parts: Vec<_> = parts.into_iter().flatten().collect();
                if parts.is_empty() {
                    return Ok(None);
                }
                self.topology.union_all(parts)?
            }
        };
        Ok(Some(polygons))
    }

    fn circle(&self, center: &Coordinate, radius: f64) -> Polygon<f64> {
        let segments = circle::segments_for(self.options.simplify_ratio);
        let ring = circle::geodesic_circle(center, radius, segments);
        Polygon::new(coords_to_line(&ring), vec![])
    }

    fn buffer_lines(&self, lines: &[Vec<Coordinate>], distance: f64) -> Result<MultiPolygon<f64>> {
        let lines = MultiLineString::new(
            lines
                .iter()
                .filter(|line| !line.is_empty())
                .map(|line| coords_to_line(&unwrap_longitudes(line, wrap_longitude(line[0].x))))
                .collect(),
        );
        let lines = densify_lines(&lines, densify_spacing(distance))?;
        let lines = lines.simplify(self.degree_tolerance(distance));
        let Some(extent) = extent_of(&lines) else {
            return Ok(MultiPolygon::new(vec![]));
        };

        let pieces = match split::plan(&extent, distance, self.options.max_split_boxes)? {
            SplitPlan::Direct => vec![Piece { shape: lines.into(), cut: None, core: None }],
            SplitPlan::Grid(grid) => {
                debug!(boxes = grid.columns, rows = grid.rows, "Splitting lines for buffering");
                let mut pieces = Vec::new();
                for cell in grid.cells() {
                    let clipped = guard("clip", || clip_lines(&lines, &cell.expanded))?;
                    if !clipped.0.is_empty() {
                        pieces.push(Piece { shape: clipped.into(), cut: None, core: None });
                    }
                }
                pieces
            }
        };
        self.buffer_pieces(pieces, distance)
    }

    fn buffer_polygon(&self, rings: &[Ring], distance: f64) -> Result<MultiPolygon<f64>> {
        let Some(exterior) = rings.first() else {
            return Ok(MultiPolygon::new(vec![]));
        };
        if is_polar(exterior) {
            return self.buffer_polar(rings, distance);
        }
        let polygon = rings_to_polygon(&unwrap_rings(rings));
        self.buffer_area(&MultiPolygon::new(vec![polygon]), distance)
    }

    fn buffer_area(&self, polygons: &MultiPolygon<f64>, distance: f64) -> Result<MultiPolygon<f64>> {
        let polygons = densify_polygons(polygons, densify_spacing(distance))?;
        let polygons = &polygons.simplify(self.degree_tolerance(distance)).orient(Direction::Default);
        let Some(extent) = extent_of(polygons) else {
            return Ok(MultiPolygon::new(vec![]));
        };

        let pieces = match split::plan(&extent, distance, self.options.max_split_boxes)? {
            SplitPlan::Direct => {
                debug!(distance, "Buffering polygon directly");
                vec![Piece { shape: polygons.clone().into(), cut: None, core: None }]
            }
            SplitPlan::Grid(grid) => {
                debug!(boxes = grid.columns, rows = grid.rows, overlap = grid.overlap.0, "Splitting polygon for buffering");
                let mut pieces = Vec::new();
                for cell in grid.cells() {
                    let clipped = guard("intersection", || clip_polygons(polygons, &cell.expanded))?;
                    if !clipped.0.is_empty() {
                        let core = grid.clips_back().then_some(cell.core);
                        pieces.push(Piece { shape: clipped.into(), cut: Some(cell.expanded), core });
                    }
                }
                pieces
            }
        };
        self.buffer_pieces(pieces, distance)
    }

    /// Members that overlap are merged before an outward buffer so their
    /// shared edges leave no seams; inward buffers run per member first.
    fn buffer_multi_polygon(&self, polygons: &[Vec<Ring>], distance: f64) -> Result<MultiPolygon<f64>> {
        let polygons: Vec<&Vec<Ring>> = polygons.iter().filter(|rings| !rings.is_empty()).collect();
        if distance < 0.0 {
            let parts = polygons
                .par_iter()
                .map(|rings| self.buffer_polygon(rings, distance))
                .collect::<Result<Vec<_>>>()?;
            return self.topology.union_all(parts);
        }

        let (polar, ordinary): (Vec<&Vec<Ring>>, Vec<&Vec<Ring>>) =
            polygons.into_iter().partition(|rings| is_polar(&rings[0]));
        let members: Vec<Polygon<f64>> = ordinary.iter().map(|rings| rings_to_polygon(&unwrap_rings(rings))).collect();

        let mut groups = Vec::new();
        for group in overlapping_groups(&members) {
            let parts = group.into_iter().map(|i| MultiPolygon::new(vec![members[i].clone()])).collect();
            groups.push(self.topology.union_all(parts)?);
        }

        let mut parts = groups
            .par_iter()
            .map(|group| self.buffer_area(group, distance))
            .collect::<Result<Vec<_>>>()?;
        parts.extend(
            polar
                .par_iter()
                .map(|rings| self.buffer_polar(rings, distance))
                .collect::<Result<Vec<_>>>()?,
        );
        self.topology.union_all(parts)
    }

    /// Simplification tolerance in degrees that stays under
    /// `simplify_ratio * |distance|` meters at any latitude.
    fn degree_tolerance(&self, distance: f64) -> f64 {
        (self.options.simplify_ratio * distance.abs() / MAX_METERS_PER_DEGREE).max(0.0)
    }

    fn buffer_pieces(&self, pieces: Vec<Piece>, distance: f64) -> Result<MultiPolygon<f64>> {
        let step = densify_spacing(distance) / MAX_METERS_PER_DEGREE;
        let parts = pieces
            .par_iter()
            .map(|piece| {
                let shape = match (&piece.cut, &piece.shape) {
                    (Some(cut), GeoGeometry::MultiPolygon(polygons)) => {
                        densify_cut_edges(polygons, cut, step).into()
                    }
                    _ => piece.shape.clone(),
                };
                let extent = extent_of(&shape).unwrap_or_default();
                let frame = ProjFrame::local(&extent)?;
                let buffered = buffer_in_frame(&shape, &frame, distance)?;
                match &piece.core {
                    Some(core) => guard("intersection", || clip_polygons(&buffered, core)),
                    None => Ok(buffered),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        self.topology.union_all(parts)
    }

    /// Buffer a polygon around a pole in the polar frame, capping any ring
    /// that still encloses the pole afterwards.
    fn buffer_polar(&self, rings: &[Ring], distance: f64) -> Result<MultiPolygon<f64>> {
        let frame = ProjFrame::polar(polar_latitude(&rings[0]))?;
        let config = InterpolationConfig::geodesic().with_spacing(densify_spacing(distance));

        let mut planar_rings = Vec::with_capacity(rings.len());
        for ring in rings {
            // Pole vertices collapse to the frame origin; drop them so a
            // capped ring closes into a plain loop around it.
            let mut coords: Vec<Coordinate> =
                ring.iter().filter(|c| c.y.abs() < 90.0 - EPSILON).copied().collect();
            interpolate_line(&mut coords, &config, &Wgs84)?;
            let mut planar: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
            for c in &coords {
                let p = frame.forward(Coord { x: c.x, y: c.y })?;
                if planar.last().is_some_and(|last| (last.x - p.x).hypot(last.y - p.y) < 1e-6) {
                    continue;
                }
                planar.push(p);
            }
            planar_rings.push(LineString::new(planar));
        }
        let mut interiors = planar_rings.split_off(1);
        interiors.retain(|ring| ring.0.len() >= 4);
        let Some(exterior) = planar_rings.pop() else {
            return Ok(MultiPolygon::new(vec![]));
        };
        let planar = Polygon::new(exterior, interiors).orient(Direction::Default);

        let tolerance = self.options.simplify_ratio * distance.abs();
        let buffered = guard("buffer", || planar.simplify(tolerance).buffer(distance))?;
        let lon_lat = buffered.try_map_coords(|c| frame.inverse(c))?;

        debug!(distance, "Buffered around pole");
        Ok(MultiPolygon::new(lon_lat.iter().map(rebuild_polar_polygon).collect()))
    }
}

/// Ring is pole-capping or already runs through a pole.
fn is_polar(exterior: &[Coordinate]) -> bool {
    is_pole_capping(exterior) || exterior.iter().any(|c| c.y.abs() >= 90.0 - EPSILON)
}

/// Mean latitude of a polar ring's off-pole vertices. The sign picks the
/// pole; a pole vertex in the ring decides it when present.
fn polar_latitude(exterior: &[Coordinate]) -> f64 {
    let is_pole = |c: &&Coordinate| c.y.abs() >= 90.0 - EPSILON;
    let pole_sign = exterior.iter().find(is_pole).map(|c| c.y.signum());
    let off_pole: Vec<f64> = exterior.iter().filter(|c| !is_pole(c)).map(|c| c.y).collect();
    let mean = if off_pole.is_empty() {
        90.0
    } else {
        off_pole.iter().sum::<f64>() / off_pole.len() as f64
    };
    let sign = pole_sign.unwrap_or(if mean < 0.0 { -1.0 } else { 1.0 });
    sign * mean.abs().clamp(1.0, 90.0)
}

/// Map into `frame`, buffer, map back.
fn buffer_in_frame(shape: &GeoGeometry<f64>, frame: &dyn LocalFrame, distance: f64) -> Result<MultiPolygon<f64>> {
    let planar = match shape.try_map_coords(|c| frame.forward(c))? {
        GeoGeometry::MultiPolygon(polygons) => polygons.orient(Direction::Default).into(),
        other => other,
    };
    let buffered = guard("buffer", || planar.buffer(distance))?;
    buffered.try_map_coords(|c| frame.inverse(c))
}

fn rebuild_polar_polygon(polygon: &Polygon<f64>) -> Polygon<f64> {
    let fix = |ring: &LineString<f64>| {
        let coords = line_to_coords(ring);
        if is_pole_capping(&coords) {
            coords_to_line(&cap_pole(&coords))
        } else {
            let anchor = coords.first().map(|c| c.x).unwrap_or(0.0);
            coords_to_line(&unwrap_longitudes(&coords, anchor))
        }
    };
    Polygon::new(fix(polygon.exterior()), polygon.interiors().iter().map(fix).collect())
}

fn densify_spacing(distance: f64) -> f64 {
    distance.abs().clamp(MIN_DENSIFY_SPACING, MAX_DENSIFY_SPACING)
}

fn densify_line(line: &LineString<f64>, config: &InterpolationConfig) -> Result<LineString<f64>> {
    let mut coords = line_to_coords(line);
    interpolate_line(&mut coords, config, &Wgs84)?;
    Ok(coords_to_line(&coords))
}

/// Insert geodesic vertices so no edge is longer than `spacing` meters.
fn densify_lines(lines: &MultiLineString<f64>, spacing: f64) -> Result<MultiLineString<f64>> {
    let config = InterpolationConfig::geodesic().with_spacing(spacing);
    Ok(MultiLineString::new(lines.iter().map(|l| densify_line(l, &config)).collect::<Result<_>>()?))
}

fn densify_polygons(polygons: &MultiPolygon<f64>, spacing: f64) -> Result<MultiPolygon<f64>> {
    let config = InterpolationConfig::geodesic().with_spacing(spacing);
    let polygon = |p: &Polygon<f64>| -> Result<Polygon<f64>> {
        let interiors = p.interiors().iter().map(|r| densify_line(r, &config)).collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(densify_line(p.exterior(), &config)?, interiors))
    };
    Ok(MultiPolygon::new(polygons.iter().map(polygon).collect::<Result<_>>()?))
}

/// Both ends lie on the same side of `cell`.
fn on_cell_edge(a: Coord<f64>, b: Coord<f64>, cell: &Rect<f64>) -> bool {
    let near = |v: f64, edge: f64| (v - edge).abs() <= CUT_EDGE_TOLERANCE;
    let (min, max) = (cell.min(), cell.max());
    (near(a.x, min.x) && near(b.x, min.x))
        || (near(a.x, max.x) && near(b.x, max.x))
        || (near(a.y, min.y) && near(b.y, min.y))
        || (near(a.y, max.y) && near(b.y, max.y))
}

/// Edges a clip laid along the cell boundary are straight in lon/lat; fill
/// them with vertices `step` degrees apart so they stay on the boundary
/// once mapped into a frame.
fn densify_cut_edges(polygons: &MultiPolygon<f64>, cell: &Rect<f64>, step: f64) -> MultiPolygon<f64> {
    let ring = |ring: &LineString<f64>| {
        let mut out = Vec::with_capacity(ring.0.len());
        for segment in ring.lines() {
            out.push(segment.start);
            if !on_cell_edge(segment.start, segment.end, cell) {
                continue;
            }
            let (dx, dy) = (segment.dx(), segment.dy());
            let n = (dx.hypot(dy) / step).ceil() as usize;
            for i in 1..n {
                let t = i as f64 / n as f64;
                out.push(coord! { x: segment.start.x + t * dx, y: segment.start.y + t * dy });
            }
        }
        out.extend(ring.0.last().copied());
        LineString::new(out)
    };
    polygons
        .iter()
        .map(|p| Polygon::new(ring(p.exterior()), p.interiors().iter().map(ring).collect()))
        .collect()
}

fn rect_to_extent(rect: Rect<f64>) -> Extent {
    Extent::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}

fn extent_of<G: BoundingRect<f64>>(shape: &G) -> Option<Extent> {
    let rect: Option<Rect<f64>> = shape.bounding_rect().into();
    rect.map(rect_to_extent)
}

/// Polygon envelope for the overlap index.
struct Member {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for Member {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Connected groups of members whose interiors or boundaries touch.
fn overlapping_groups(members: &[Polygon<f64>]) -> Vec<Vec<usize>> {
    let indexed: Vec<Member> = members
        .iter()
        .enumerate()
        .filter_map(|(index, polygon)| {
            let rect = polygon.bounding_rect()?;
            Some(Member {
                index,
                envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            })
        })
        .collect();
    let tree = RTree::bulk_load(indexed);

    let mut parent: Vec<usize> = (0..members.len()).collect();
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for member in tree.iter() {
        for other in tree.locate_in_envelope_intersecting(&member.envelope) {
            if other.index <= member.index || !members[member.index].intersects(&members[other.index]) {
                continue;
            }
            let (a, b) = (root(&mut parent, member.index), root(&mut parent, other.index));
            if a != b {
                parent[b] = a;
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot = vec![usize::MAX; members.len()];
    for i in 0..members.len() {
        let r = root(&mut parent, i);
        if slot[r] == usize::MAX {
            slot[r] = groups.len();
            groups.push(Vec::new());
        }
        groups[slot[r]].push(i);
    }
    groups
}
