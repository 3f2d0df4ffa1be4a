//! Structural checks on native geometry, run before anything reaches the
//! topology library.

use crate::models::{is_closed, Coordinate, Geometry, Shape};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    fn absorb(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
            self.errors.extend(other.errors);
        }
    }

    /// All reasons joined for a single error message.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.location, e.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate coordinate finiteness, vertex counts and ring closure.
pub fn validate_structure(geometry: &Geometry) -> ValidationResult {
    let mut result = ValidationResult::valid();
    match &geometry.shape {
        Shape::Point(c) => check_finite(&mut result, "Point", std::slice::from_ref(c)),
        Shape::MultiPoint(coords) => check_finite(&mut result, "MultiPoint", coords),
        Shape::LineString(coords) => check_line(&mut result, "LineString", coords),
        Shape::LinearRing(ring) => check_ring(&mut result, "LinearRing", ring),
        Shape::Polygon(rings) => check_polygon(&mut result, "Polygon", rings),
        Shape::MultiLineString(lines) => {
            for (i, line) in lines.iter().enumerate() {
                check_line(&mut result, &format!("MultiLineString[{}]", i), line);
            }
        }
        Shape::MultiPolygon(polygons) => {
            for (i, rings) in polygons.iter().enumerate() {
                check_polygon(&mut result, &format!("MultiPolygon[{}]", i), rings);
            }
        }
        Shape::GeometryCollection(members) => {
            for member in members {
                result.absorb(validate_structure(member));
            }
        }
    }
    result
}

fn check_finite(result: &mut ValidationResult, location: &str, coords: &[Coordinate]) {
    for (i, coord) in coords.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite".to_string());
        }
    }
}

fn check_line(result: &mut ValidationResult, location: &str, coords: &[Coordinate]) {
    // LineString must have at least 2 points
    if coords.len() < 2 {
        result.add_error(
            location.to_string(),
            format!("LineString must have at least 2 points, found {}", coords.len()),
        );
        return;
    }
    check_finite(result, location, coords);
}

fn check_ring(result: &mut ValidationResult, location: &str, ring: &[Coordinate]) {
    if ring.len() < 4 {
        result.add_error(
            location.to_string(),
            format!("Ring must have at least 4 points, found {}", ring.len()),
        );
    } else if !is_closed(ring) {
        result.add_error(
            location.to_string(),
            "Ring must be closed (first point == last point)".to_string(),
        );
    }
    check_finite(result, location, ring);
}

fn check_polygon(result: &mut ValidationResult, location: &str, rings: &[Vec<Coordinate>]) {
    for (i, ring) in rings.iter().enumerate() {
        let role = if i == 0 { "exterior".to_string() } else { format!("interior[{}]", i - 1) };
        check_ring(result, &format!("{} {}", location, role), ring);
    }
}
