//! Reference ellipsoids for the legacy Vincenty path.

use serde::{Deserialize, Serialize};

/// Semi-major axis `a`, semi-minor axis `b` and flattening `f`, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    pub a: f64,
    pub b: f64,
    pub f: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid::from_flattening(6_378_137.0, 1.0 / 298.257_223_563);

    pub const GRS80: Ellipsoid = Ellipsoid::from_flattening(6_378_137.0, 1.0 / 298.257_222_101);

    /// Build from semi-major axis and flattening.
    pub const fn from_flattening(a: f64, f: f64) -> Self {
        Self { a, b: a * (1.0 - f), f }
    }

    /// Build from both semi-axes.
    pub fn from_axes(a: f64, b: f64) -> Self {
        Self { a, b, f: (a - b) / a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_axes() {
        let wgs84 = Ellipsoid::default();
        assert!((wgs84.b - 6_356_752.314_245).abs() < 1e-3);
        let rebuilt = Ellipsoid::from_axes(wgs84.a, wgs84.b);
        assert!((rebuilt.f - wgs84.f).abs() < 1e-15);
    }
}
