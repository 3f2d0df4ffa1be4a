//! Planar topology through the `geo` crate: translation between native and
//! `geo` geometry, boolean operations and validity repair.
//!
//! `geo` can panic on degenerate input. Every call into it from this module
//! runs under [`guard`], which turns a panic into a topology error.

use crate::models::{from_geo_geometry, to_geo_geometry, Geometry, GeometryType, Shape};
use crate::validation::validate_structure;
use geo::orient::{Direction, Orient};
use geo::{BooleanOps, Geometry as GeoGeometry, LineString, MultiPolygon, Polygon, Validation};
use meridian_core::config::DEFAULT_PRECISION_TOLERANCE;
use meridian_core::error::{MeridianError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Run `f`, converting a panic inside the topology library into an error.
pub fn guard<T>(operation: &str, f: impl FnOnce() -> T) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|panic| {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic in topology library".to_string());
        MeridianError::topology(operation, reason)
    })
}

/// Polygonal content of a geo geometry as one MultiPolygon.
pub fn polygons_of(geometry: &GeoGeometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        GeoGeometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        GeoGeometry::MultiPolygon(mp) => Some(mp.clone()),
        GeoGeometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        GeoGeometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        GeoGeometry::GeometryCollection(gc) => {
            let mut polygons = Vec::new();
            for member in gc.iter() {
                polygons.extend(polygons_of(member)?.0);
            }
            Some(MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

/// Sum of planar ring lengths.
pub fn planar_perimeter(polygons: &MultiPolygon<f64>) -> f64 {
    fn ring_length(ring: &LineString<f64>) -> f64 {
        ring.lines().map(|l| l.dx().hypot(l.dy())).sum()
    }
    polygons
        .iter()
        .map(|p| ring_length(p.exterior()) + p.interiors().iter().map(ring_length).sum::<f64>())
        .sum()
}

/// Translator and boolean-operation front for the `geo` crate.
#[derive(Debug, Clone, Copy)]
pub struct TopologyAdapter {
    /// Relative perimeter change above which a repair is reported as lossy.
    precision_tolerance: f64,
}

impl Default for TopologyAdapter {
    fn default() -> Self {
        Self { precision_tolerance: DEFAULT_PRECISION_TOLERANCE }
    }
}

impl TopologyAdapter {
    pub fn new(precision_tolerance: f64) -> Self {
        Self { precision_tolerance }
    }

    pub fn precision_tolerance(&self) -> f64 {
        self.precision_tolerance
    }

    /// Native to `geo`. Rings must be closed with at least four coordinates.
    pub fn read(&self, geometry: &Geometry) -> Result<GeoGeometry<f64>> {
        if geometry.is_empty() {
            return Err(MeridianError::EmptyGeometry);
        }
        let report = validate_structure(geometry);
        if !report.is_valid {
            return Err(MeridianError::InvalidGeometry { reason: report.summary() });
        }
        Ok(to_geo_geometry(geometry))
    }

    /// `geo` to native.
    pub fn write(&self, geometry: &GeoGeometry<f64>) -> Geometry {
        from_geo_geometry(geometry)
    }

    /// Write polygons back as a Polygon when there is exactly one.
    pub fn write_polygons(&self, polygons: MultiPolygon<f64>) -> Geometry {
        if polygons.0.len() == 1 {
            let mut polygons = polygons.0;
            self.write(&GeoGeometry::Polygon(polygons.remove(0)))
        } else {
            self.write(&GeoGeometry::MultiPolygon(polygons))
        }
    }

    fn read_polygons(&self, geometry: &Geometry, operation: &str) -> Result<MultiPolygon<f64>> {
        let geo = self.read(geometry)?;
        polygons_of(&geo).ok_or_else(|| MeridianError::unsupported(geometry.geometry_type().to_string(), operation))
    }

    pub fn union(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        let (a, b) = (self.read_polygons(a, "union")?, self.read_polygons(b, "union")?);
        Ok(self.write_polygons(guard("union", || a.union(&b))?))
    }

    pub fn intersection(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        let (a, b) = (self.read_polygons(a, "intersection")?, self.read_polygons(b, "intersection")?);
        Ok(self.write_polygons(guard("intersection", || a.intersection(&b))?))
    }

    pub fn difference(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        let (a, b) = (self.read_polygons(a, "difference")?, self.read_polygons(b, "difference")?);
        Ok(self.write_polygons(guard("difference", || a.difference(&b))?))
    }

    /// Union of many polygon sets at the `geo` level.
    pub fn union_all(&self, parts: Vec<MultiPolygon<f64>>) -> Result<MultiPolygon<f64>> {
        guard("union", || {
            parts
                .into_iter()
                .fold(MultiPolygon::new(vec![]), |acc, part| acc.union(&part))
        })
    }

    /// Repair `geometry`, dropping the precision flag.
    pub fn validate(&self, geometry: &Geometry, quiet: bool) -> Geometry {
        self.validate_with_report(geometry, quiet).0
    }

    /// Repair polygonal geometry and report whether the repair moved the
    /// perimeter by more than the precision tolerance.
    ///
    /// Valid input only has its rings reoriented (exterior counter-clockwise,
    /// holes clockwise). Invalid input is rebuilt from its noded rings. When
    /// repair fails the input comes back unchanged. Non-polygonal geometry
    /// passes through.
    pub fn validate_with_report(&self, geometry: &Geometry, quiet: bool) -> (Geometry, bool) {
        if geometry.is_empty() {
            return (geometry.clone(), false);
        }
        match geometry.geometry_type() {
            GeometryType::Polygon | GeometryType::MultiPolygon => {}
            GeometryType::GeometryCollection => return self.validate_members(geometry, quiet),
            _ => return (geometry.clone(), false),
        }

        match self.repair(geometry, quiet) {
            Ok(result) => result,
            Err(e) => {
                if !quiet {
                    warn!(error = %e, "Geometry repair failed; returning input unchanged");
                }
                (geometry.clone(), false)
            }
        }
    }

    fn validate_members(&self, geometry: &Geometry, quiet: bool) -> (Geometry, bool) {
        let Shape::GeometryCollection(members) = &geometry.shape else {
            return (geometry.clone(), false);
        };
        let mut imprecise = false;
        let repaired = members
            .iter()
            .map(|member| {
                let (out, flag) = self.validate_with_report(member, quiet);
                imprecise |= flag;
                out
            })
            .collect();
        (geometry.with_shape(Shape::GeometryCollection(repaired)), imprecise)
    }

    fn repair(&self, geometry: &Geometry, quiet: bool) -> Result<(Geometry, bool)> {
        let polygons = self.read_polygons(geometry, "validate")?;
        let keep_type = |out: Geometry| {
            let out = match (geometry.geometry_type(), out.shape) {
                (GeometryType::MultiPolygon, Shape::Polygon(rings)) => Shape::MultiPolygon(vec![rings]),
                (_, shape) => shape,
            };
            geometry.with_shape(out)
        };

        if guard("validate", || polygons.is_valid())? {
            let oriented = polygons.orient(Direction::Default);
            return Ok((keep_type(self.write_polygons(oriented)), false));
        }

        debug!(polygons = polygons.0.len(), "Repairing invalid geometry");
        let repaired = guard("validate", || rebuild(&polygons))?;
        let before = planar_perimeter(&polygons);
        let after = planar_perimeter(&repaired);
        let change = if before > 0.0 { (after - before).abs() / before } else { 0.0 };
        let imprecise = change > self.precision_tolerance;
        if imprecise && !quiet {
            warn!(
                change_percent = change * 100.0,
                tolerance_percent = self.precision_tolerance * 100.0,
                "Repaired geometry perimeter moved beyond tolerance"
            );
        }
        Ok((keep_type(self.write_polygons(repaired.orient(Direction::Default))), imprecise))
    }
}

/// Node every ring on its own, combine the rings of each polygon with
/// symmetric difference so holes cut their shell, and union the results.
fn rebuild(polygons: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let empty = MultiPolygon::<f64>::new(vec![]);
    polygons
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| Polygon::new(ring.clone(), vec![]).union(&empty))
                .fold(MultiPolygon::new(vec![]), |acc, noded| acc.xor(&noded))
        })
        .fold(MultiPolygon::new(vec![]), |acc, fragment| acc.union(&fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ring;
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, size: f64) -> Vec<[f64; 2]> {
        vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]
    }

    fn rings(geometry: &Geometry) -> Vec<Ring> {
        match &geometry.shape {
            Shape::Polygon(rings) => rings.clone(),
            Shape::MultiPolygon(polygons) => polygons.iter().flatten().cloned().collect(),
            other => panic!("expected polygonal geometry, got {:?}", other),
        }
    }

    fn signed_area(ring: &[crate::models::Coordinate]) -> f64 {
        ring.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    #[test]
    fn test_read_rejects_open_ring() {
        let adapter = TopologyAdapter::default();
        let open = Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]);
        assert!(matches!(adapter.read(&open), Err(MeridianError::InvalidGeometry { .. })));
        assert!(matches!(
            adapter.read(&Geometry::line_string(vec![])),
            Err(MeridianError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_valid_polygon_is_only_reoriented() {
        let adapter = TopologyAdapter::default();
        // Clockwise shell with a counter-clockwise hole
        let mut shell = square(0.0, 0.0, 10.0);
        shell.reverse();
        let hole = square(2.0, 2.0, 2.0);
        let polygon = Geometry::polygon(vec![shell, hole]);

        let (out, imprecise) = adapter.validate_with_report(&polygon, true);
        assert!(!imprecise);
        let out_rings = rings(&out);
        assert_eq!(out_rings.len(), 2);
        assert!(signed_area(&out_rings[0]) > 0.0);
        assert!(signed_area(&out_rings[1]) < 0.0);

        let before = planar_perimeter(&polygons_of(&to_geo_geometry(&polygon)).unwrap());
        let after = planar_perimeter(&polygons_of(&to_geo_geometry(&out)).unwrap());
        assert_relative_eq!(before, after, epsilon = 1e-9);
    }

    #[test]
    fn test_bowtie_is_repaired() {
        let adapter = TopologyAdapter::default();
        let bowtie = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [2.0, 2.0],
            [2.0, 0.0],
            [0.0, 2.0],
            [0.0, 0.0],
        ]]);
        let out = adapter.validate(&bowtie, true);
        let geo = adapter.read(&out).unwrap();
        assert!(polygons_of(&geo).unwrap().is_valid());
        assert!(!rings(&out).is_empty());
    }

    #[test]
    fn test_non_polygonal_passes_through() {
        let adapter = TopologyAdapter::default();
        let line = Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert_eq!(adapter.validate(&line, true), line);
    }

    #[test]
    fn test_boolean_operations() {
        let adapter = TopologyAdapter::default();
        let a = Geometry::polygon(vec![square(0.0, 0.0, 2.0)]);
        let b = Geometry::polygon(vec![square(1.0, 1.0, 2.0)]);

        let union = adapter.union(&a, &b).unwrap();
        assert_eq!(union.geometry_type(), GeometryType::Polygon);
        let intersection = adapter.intersection(&a, &b).unwrap();
        let extent = intersection.extent();
        assert_relative_eq!(extent.min_x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(extent.max_x, 2.0, epsilon = 1e-9);

        let far = Geometry::polygon(vec![square(10.0, 10.0, 1.0)]);
        let both = adapter.union(&a, &far).unwrap();
        assert_eq!(both.geometry_type(), GeometryType::MultiPolygon);

        let difference = adapter.difference(&a, &b).unwrap();
        assert_eq!(difference.geometry_type(), GeometryType::Polygon);
    }

    #[test]
    fn test_boolean_rejects_lines() {
        let adapter = TopologyAdapter::default();
        let a = Geometry::polygon(vec![square(0.0, 0.0, 2.0)]);
        let line = Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(adapter.union(&a, &line), Err(MeridianError::UnsupportedGeometry { .. })));
    }

    #[test]
    fn test_guard_catches_panic() {
        let result: Result<()> = guard("test", || panic!("boom"));
        match result {
            Err(MeridianError::Topology { operation, reason }) => {
                assert_eq!(operation, "test");
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
