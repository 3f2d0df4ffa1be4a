//! Reading geometry arguments and writing results as GeoJSON or WKT.

use crate::errors::geometry_unreadable;
use anyhow::{Context, Result};
use meridian_core::models::Geometry;
use meridian_geo::models::{from_geo_geometry, GeometryExt};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use wkt::ToWkt;

fn looks_inline(input: &str) -> bool {
    let trimmed = input.trim_start();
    trimmed.starts_with('{') || trimmed.contains('(') || trimmed.to_uppercase().ends_with("EMPTY")
}

/// Read a geometry given inline as GeoJSON or WKT, or as a file path.
pub fn read_geometry(input: &str) -> Result<Geometry> {
    let text = if looks_inline(input) {
        input.to_string()
    } else {
        let path = Path::new(input);
        if !path.is_file() {
            return Err(geometry_unreadable(input, "not GeoJSON, WKT, or an existing file").into());
        }
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };

    let geometry = parse_geometry(&text).map_err(|reason| geometry_unreadable(input, &reason))?;
    tracing::debug!(geometry_type = %geometry.geometry_type(), "Read geometry");
    Ok(geometry)
}

/// Parse GeoJSON (geometry, feature or feature collection) or WKT text.
pub fn parse_geometry(text: &str) -> std::result::Result<Geometry, String> {
    let text = text.trim();
    let geometry: geo::Geometry<f64> = if text.starts_with('{') {
        let geojson: geojson::GeoJson = text.parse().map_err(|e: geojson::Error| e.to_string())?;
        geo::Geometry::try_from(geojson).map_err(|e| e.to_string())?
    } else {
        let wkt = wkt::Wkt::<f64>::from_str(text).map_err(|e| e.to_string())?;
        geo::Geometry::try_from(wkt).map_err(|e| e.to_string())?
    };
    Ok(from_geo_geometry(&geometry))
}

/// GeoJSON geometry object for `geometry`.
pub fn to_geojson(geometry: &Geometry) -> Result<serde_json::Value> {
    let value = geojson::Value::from(&geometry.to_geo());
    Ok(serde_json::to_value(geojson::Geometry::new(value))?)
}

pub fn to_wkt(geometry: &Geometry) -> String {
    geometry.to_geo().wkt_string()
}

/// Serialized form for output: a WKT string or a GeoJSON object.
pub fn render(geometry: &Geometry, as_wkt: bool) -> Result<serde_json::Value> {
    if as_wkt {
        Ok(serde_json::Value::String(to_wkt(geometry)))
    } else {
        to_geojson(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::models::Shape;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_geojson_geometry() {
        let g = read_geometry(r#"{"type":"LineString","coordinates":[[170,0],[-170,0]]}"#).unwrap();
        assert!(matches!(g.shape, Shape::LineString(ref c) if c.len() == 2));
    }

    #[test]
    fn test_reads_geojson_feature() {
        let text = r#"{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,2]}}"#;
        let g = read_geometry(text).unwrap();
        assert_eq!(g, Geometry::point(1.0, 2.0));
    }

    #[test]
    fn test_reads_wkt() {
        let g = read_geometry("POLYGON((0 0, 1 0, 1 1, 0 0))").unwrap();
        assert!(matches!(g.shape, Shape::Polygon(ref rings) if rings[0].len() == 4));
    }

    #[test]
    fn test_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "POINT(10 20)").unwrap();
        let g = read_geometry(file.path().to_str().unwrap()).unwrap();
        assert_eq!(g, Geometry::point(10.0, 20.0));
    }

    #[test]
    fn test_rejects_unknown_input() {
        assert!(read_geometry("/no/such/file.geojson").is_err());
        assert!(read_geometry("LINESTRING(oops)").is_err());
    }

    #[test]
    fn test_render_geojson_and_wkt() {
        let g = Geometry::point(1.0, 2.0);
        let json = render(&g, false).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"], serde_json::json!([1.0, 2.0]));
        assert_eq!(render(&g, true).unwrap(), serde_json::json!("POINT(1 2)"));
    }
}
