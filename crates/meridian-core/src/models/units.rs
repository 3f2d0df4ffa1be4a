//! Reference systems and distance units.

use serde::{Deserialize, Serialize};

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }

    /// Short `EPSG:nnnn` code.
    pub fn code(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

/// Distance units for spatial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
    NauticalMiles,
    Feet,
}

impl DistanceUnit {
    /// Convert a distance value to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Kilometers => value * 1000.0,
            DistanceUnit::Miles => value * 1609.344,
            DistanceUnit::NauticalMiles => value * 1852.0,
            DistanceUnit::Feet => value * 0.3048,
        }
    }

    /// Convert a distance value from meters to this unit
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / 1000.0,
            DistanceUnit::Miles => meters / 1609.344,
            DistanceUnit::NauticalMiles => meters / 1852.0,
            DistanceUnit::Feet => meters / 0.3048,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
            DistanceUnit::NauticalMiles => "nmi",
            DistanceUnit::Feet => "ft",
        }
    }
}

/// Distance with unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    /// Create a new distance
    pub fn new(value: f64, unit: DistanceUnit) -> Self {
        Self { value, unit }
    }

    /// Create distance in meters
    pub fn meters(value: f64) -> Self {
        Self::new(value, DistanceUnit::Meters)
    }

    /// Create distance in kilometers
    pub fn kilometers(value: f64) -> Self {
        Self::new(value, DistanceUnit::Kilometers)
    }

    /// Convert to meters
    pub fn to_meters(&self) -> f64 {
        self.unit.to_meters(self.value)
    }
}
