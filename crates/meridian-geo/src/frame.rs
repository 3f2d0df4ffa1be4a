//! Planar metric frames used for buffering.
//!
//! A frame maps lon/lat degrees to meters on a plane where `geo`'s planar
//! buffer gives distances close to geodesic ones, and back. Frames are
//! built by libproj: transverse Mercator on the shape's central meridian,
//! polar stereographic around a pole.

use crate::models::Extent;
use geo::Coord;
use meridian_core::error::{MeridianError, Result};
use proj::Proj;
use std::fmt;
use std::sync::Mutex;

/// Forward and inverse mapping between lon/lat and a local plane in meters.
pub trait LocalFrame: Send + Sync + fmt::Debug {
    fn forward(&self, lon_lat: Coord<f64>) -> Result<Coord<f64>>;
    fn inverse(&self, planar: Coord<f64>) -> Result<Coord<f64>>;
}

/// A frame defined by a PROJ string.
pub struct ProjFrame {
    definition: String,
    forward: Mutex<Proj>,
    inverse: Mutex<Proj>,
}

// SAFETY: each `Proj` owns its own PROJ context and is only reached through
// a `Mutex`, so it is never used from two threads at once.
unsafe impl Send for ProjFrame {}
unsafe impl Sync for ProjFrame {}

impl fmt::Debug for ProjFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjFrame").field("definition", &self.definition).finish()
    }
}

fn frame_error(e: impl fmt::Display) -> MeridianError {
    MeridianError::Projection { reason: e.to_string() }
}

impl ProjFrame {
    pub fn new(definition: impl Into<String>) -> Result<Self> {
        let definition = definition.into();
        let forward = Proj::new_known_crs("EPSG:4326", &definition, None).map_err(frame_error)?;
        let inverse = Proj::new_known_crs(&definition, "EPSG:4326", None).map_err(frame_error)?;
        Ok(Self { definition, forward: Mutex::new(forward), inverse: Mutex::new(inverse) })
    }

    /// Transverse Mercator with unit scale on `central_meridian`.
    pub fn transverse_mercator(central_meridian: f64) -> Result<Self> {
        Self::new(format!(
            "+proj=tmerc +lat_0=0 +lon_0={} +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs +type=crs",
            central_meridian
        ))
    }

    /// Polar stereographic around the pole on the side of `true_scale_lat`,
    /// with unit scale along that parallel.
    pub fn polar_stereographic(true_scale_lat: f64) -> Result<Self> {
        let pole = if true_scale_lat >= 0.0 { 90 } else { -90 };
        Self::new(format!(
            "+proj=stere +lat_0={} +lat_ts={} +lon_0=0 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs +type=crs",
            pole, true_scale_lat
        ))
    }

    /// Frame for buffering a shape covering `extent`.
    pub fn local(extent: &Extent) -> Result<Self> {
        Self::transverse_mercator(extent.center().x)
    }

    /// Frame for buffering a ring circling the pole at about `latitude`.
    pub fn polar(latitude: f64) -> Result<Self> {
        Self::polar_stereographic(latitude)
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    fn convert(proj: &Mutex<Proj>, c: Coord<f64>) -> Result<Coord<f64>> {
        let guard = proj.lock().map_err(frame_error)?;
        let (x, y) = guard.convert((c.x, c.y)).map_err(frame_error)?;
        Ok(Coord { x, y })
    }
}

impl LocalFrame for ProjFrame {
    fn forward(&self, lon_lat: Coord<f64>) -> Result<Coord<f64>> {
        Self::convert(&self.forward, lon_lat)
    }

    fn inverse(&self, planar: Coord<f64>) -> Result<Coord<f64>> {
        Self::convert(&self.inverse, planar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Distance, Geodesic, Point};

    fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
        (a.x - b.x).hypot(a.y - b.y)
    }

    #[test]
    fn test_local_frame_is_centered_on_extent() {
        let frame = ProjFrame::local(&Extent::new(10.0, 40.0, 16.0, 46.0)).unwrap();
        assert!(frame.definition().contains("+lon_0=13"));
        let planar = frame.forward(Coord { x: 13.0, y: 0.0 }).unwrap();
        assert!(planar.x.abs() < 1e-6 && planar.y.abs() < 1e-6);
    }

    #[test]
    fn test_transverse_mercator_keeps_scale_near_central_meridian() {
        let frame = ProjFrame::transverse_mercator(20.0).unwrap();
        let a = Coord { x: 22.5, y: 45.0 };
        let b = Coord { x: 22.5, y: 45.5 };
        let planar = planar_distance(frame.forward(a).unwrap(), frame.forward(b).unwrap());
        let geodesic = Geodesic.distance(Point::from(a), Point::from(b));
        assert_relative_eq!(planar, geodesic, max_relative = 1e-3);
    }

    #[test]
    fn test_transverse_mercator_round_trip() {
        let frame = ProjFrame::transverse_mercator(179.0).unwrap();
        for target in [Coord { x: 177.5, y: -28.0 }, Coord { x: -179.0, y: -33.0 }, Coord { x: 179.0, y: -30.0 }] {
            let back = frame.inverse(frame.forward(target).unwrap()).unwrap();
            assert_relative_eq!(back.x, target.x, epsilon = 1e-7);
            assert_relative_eq!(back.y, target.y, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_polar_frame_true_scale_on_its_parallel() {
        for lat in [80.0, -75.0] {
            let frame = ProjFrame::polar(lat).unwrap();
            let a = Coord { x: 30.0, y: lat };
            let b = Coord { x: 31.0, y: lat };
            let planar = planar_distance(frame.forward(a).unwrap(), frame.forward(b).unwrap());
            let geodesic = Geodesic.distance(Point::from(a), Point::from(b));
            assert_relative_eq!(planar, geodesic, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_polar_frame_pole_is_origin() {
        let frame = ProjFrame::polar(80.0).unwrap();
        let origin = frame.forward(Coord { x: 33.0, y: 90.0 }).unwrap();
        assert!(origin.x.abs() < 1e-6 && origin.y.abs() < 1e-6);
        let back = frame.inverse(frame.forward(Coord { x: -120.0, y: 84.0 }).unwrap()).unwrap();
        assert_relative_eq!(back.x, -120.0, epsilon = 1e-7);
        assert_relative_eq!(back.y, 84.0, epsilon = 1e-7);
    }
}
