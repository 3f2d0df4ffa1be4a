//! Coordinate text parsing and formatting.
//!
//! Input goes through three stages: a tokenizer recognising numbers,
//! hemisphere letters, unit symbols and separators; a grouper splitting the
//! tokens into the two halves of a pair; and per-format readers for decimal
//! degrees (DD), degrees and decimal minutes (DDM) and degrees, minutes and
//! seconds (DMS), each in delimited or concatenated form.
//!
//! ```
//! use meridian_geo::parse::{parse_lat_lon, LatLon};
//!
//! let position = parse_lat_lon("40°26'46\"N 79°58'56\"W", None, None).unwrap();
//! assert!((position.lat - 40.446_111).abs() < 1e-5);
//! assert!((position.lon + 79.982_222).abs() < 1e-5);
//! ```

mod format;
mod grammar;
mod resolve;
mod token;

pub use format::{format_lat, format_lat_lon, format_lon};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use token::Kind;
use tracing::debug;

/// A parsed position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn swapped(self) -> Self {
        Self { lat: self.lon, lon: self.lat }
    }

    fn in_range(&self) -> bool {
        self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}

/// Order of the two values when no hemisphere letters say otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordinateOrder {
    #[default]
    LatFirst,
    LonFirst,
}

impl CoordinateOrder {
    pub fn opposite(&self) -> Self {
        match self {
            CoordinateOrder::LatFirst => CoordinateOrder::LonFirst,
            CoordinateOrder::LonFirst => CoordinateOrder::LatFirst,
        }
    }
}

impl FromStr for CoordinateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lat-first" | "latlon" | "lat-lon" => Ok(CoordinateOrder::LatFirst),
            "lon-first" | "lonlat" | "lon-lat" => Ok(CoordinateOrder::LonFirst),
            other => Err(format!("Invalid coordinate order: {}. Use lat-first or lon-first", other)),
        }
    }
}

/// Notation of a single coordinate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoordinateFormat {
    /// Decimal degrees, `40.446`.
    #[default]
    DD,
    /// Degrees and decimal minutes, `40 26.767` or `4026.767`.
    DDM,
    /// Degrees, minutes and seconds, `40 26 46` or `402646`.
    DMS,
}

impl CoordinateFormat {
    pub const ALL: [CoordinateFormat; 3] =
        [CoordinateFormat::DD, CoordinateFormat::DDM, CoordinateFormat::DMS];
}

impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateFormat::DD => f.write_str("DD"),
            CoordinateFormat::DDM => f.write_str("DDM"),
            CoordinateFormat::DMS => f.write_str("DMS"),
        }
    }
}

impl FromStr for CoordinateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DD" => Ok(CoordinateFormat::DD),
            "DDM" | "DM" => Ok(CoordinateFormat::DDM),
            "DMS" => Ok(CoordinateFormat::DMS),
            other => Err(format!("Invalid coordinate format: {}. Use DD, DDM, or DMS", other)),
        }
    }
}

fn allowed(format: Option<CoordinateFormat>, candidate: CoordinateFormat) -> bool {
    format.map_or(true, |f| f == candidate)
}

/// Order suggested by the first value alone: a decimal point sitting past
/// the third character cannot belong to a latitude.
fn infer_order(first: &grammar::Group) -> CoordinateOrder {
    match first.components.as_slice() {
        [only] if resolve::decimal_index(&only.text) > 3 => CoordinateOrder::LonFirst,
        _ => CoordinateOrder::LatFirst,
    }
}

/// Parse a latitude/longitude pair.
///
/// Hemisphere letters fix which value is which. Without them `order` is
/// used; when that is also absent the order is guessed, the opposite order
/// is tried on failure, and a latitude beyond ±90 is swapped with its
/// longitude. `format` restricts the notations tried.
pub fn parse_lat_lon(
    text: &str,
    order: Option<CoordinateOrder>,
    format: Option<CoordinateFormat>,
) -> Option<LatLon> {
    let tokens = token::tokenize(text)?;
    let (first, second) = grammar::split_pair(&tokens)?;

    let first_kind = first.direction.map(|d| d.kind());
    let second_kind = second.direction.map(|d| d.kind());
    if first_kind.is_some() && first_kind == second_kind {
        return None;
    }
    let lettered = match (first_kind, second_kind) {
        (Some(Kind::Latitude), _) | (None, Some(Kind::Longitude)) => Some(CoordinateOrder::LatFirst),
        (Some(Kind::Longitude), _) | (None, Some(Kind::Latitude)) => Some(CoordinateOrder::LonFirst),
        (None, None) => None,
    };

    let orders = match lettered.or(order) {
        Some(fixed) => vec![fixed],
        None => {
            let assumed = infer_order(&first);
            vec![assumed, assumed.opposite()]
        }
    };
    let explicit = lettered.is_some() || order.is_some();

    for assumed in orders {
        for config in grammar::configs(assumed).iter().filter(|c| allowed(format, c.format)) {
            let Some(a) = grammar::read_group(&first, config.format, config.first) else {
                continue;
            };
            let Some(b) = grammar::read_group(&second, config.format, config.second) else {
                continue;
            };
            let mut position = match config.first {
                Kind::Latitude => LatLon::new(a, b),
                Kind::Longitude => LatLon::new(b, a),
            };
            if !explicit && position.lat.abs() > 90.0 {
                position = position.swapped();
            }
            if position.in_range() {
                return Some(position);
            }
        }
    }

    debug!(input = text, "No coordinate format matched");
    None
}

fn parse_single(text: &str, format: Option<CoordinateFormat>, kind: Kind) -> Option<f64> {
    let group = grammar::single_group(&token::tokenize(text)?)?;
    CoordinateFormat::ALL
        .iter()
        .filter(|f| allowed(format, **f))
        .find_map(|f| grammar::read_group(&group, *f, kind))
        .filter(|value| value.abs() <= kind.max_degrees())
}

/// Parse a lone latitude. Returns NaN when the text is not one.
pub fn parse_lat(text: &str, format: Option<CoordinateFormat>) -> f64 {
    parse_single(text, format, Kind::Latitude).unwrap_or(f64::NAN)
}

/// Parse a lone longitude. Returns NaN when the text is not one.
pub fn parse_lon(text: &str, format: Option<CoordinateFormat>) -> f64 {
    parse_single(text, format, Kind::Longitude).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_position(text: &str, lat: f64, lon: f64) {
        let position = parse_lat_lon(text, None, None)
            .unwrap_or_else(|| panic!("failed to parse {:?}", text));
        assert!((position.lat - lat).abs() < 1e-6, "{:?}: lat {} != {}", text, position.lat, lat);
        assert!((position.lon - lon).abs() < 1e-6, "{:?}: lon {} != {}", text, position.lon, lon);
    }

    #[test]
    fn test_decimal_degrees() {
        assert_position("40.446, -79.982", 40.446, -79.982);
        assert_position("40.446 -79.982", 40.446, -79.982);
        assert_position("40.446N 79.982W", 40.446, -79.982);
        assert_position("N40.446 W79.982", 40.446, -79.982);
        assert_position("40.446° N, 79.982° W", 40.446, -79.982);
    }

    #[test]
    fn test_letters_fix_order() {
        assert_position("79.982W 40.446N", 40.446, -79.982);
        assert_position("E 105.5 S 33.25", -33.25, 105.5);
        assert!(parse_lat_lon("40N 50N", None, None).is_none());
    }

    #[test]
    fn test_degrees_minutes() {
        assert_position("40 26.767, -79 58.933", 40.0 + 26.767 / 60.0, -(79.0 + 58.933 / 60.0));
        assert_position("4026.767N 07958.933W", 40.0 + 26.767 / 60.0, -(79.0 + 58.933 / 60.0));
    }

    #[test]
    fn test_degrees_minutes_seconds() {
        let lat = 40.0 + 26.0 / 60.0 + 46.0 / 3600.0;
        let lon = -(79.0 + 58.0 / 60.0 + 56.0 / 3600.0);
        assert_position("40°26'46\"N 79°58'56\"W", lat, lon);
        assert_position("40:26:46 N, 79:58:56 W", lat, lon);
        assert_position("402646N 0795856W", lat, lon);
        assert_position("40 26 46 -79 58 56", lat, lon);
    }

    #[test]
    fn test_longitude_first_by_decimal_position() {
        assert_position("-105.25 40.5", 40.5, -105.25);
    }

    #[test]
    fn test_swap_when_latitude_out_of_range() {
        assert_position("105 40", 40.0, 105.0);
        // An explicit order disables the swap
        assert!(parse_lat_lon("105 40", Some(CoordinateOrder::LatFirst), None).is_none());
        let position = parse_lat_lon("105 40", Some(CoordinateOrder::LonFirst), None).unwrap();
        assert_eq!(position, LatLon::new(40.0, 105.0));
    }

    #[test]
    fn test_concatenated_longitude_first() {
        // 10530 only reads as a longitude with three degree digits
        assert_position("10530 4030", 40.5, 105.5);
        assert_position("4030 10530", 40.5, 105.5);
    }

    #[test]
    fn test_format_restriction() {
        assert!(parse_lat_lon("40 30, 105 30", None, Some(CoordinateFormat::DD)).is_none());
        let position = parse_lat_lon("40 30, 105 30", None, Some(CoordinateFormat::DDM)).unwrap();
        assert_eq!(position, LatLon::new(40.5, 105.5));
    }

    #[test]
    fn test_invalid_components() {
        assert!(parse_lat_lon("40 60, 105 30", None, None).is_none());
        assert!(parse_lat_lon("40 30 60, 105 30 10", None, None).is_none());
        assert!(parse_lat_lon("95N 105W", None, None).is_none());
        assert!(parse_lat_lon("40N 185W", None, None).is_none());
        assert!(parse_lat_lon("hello", None, None).is_none());
        assert!(parse_lat_lon("40", None, None).is_none());
    }

    #[test]
    fn test_single_values() {
        assert_eq!(parse_lat("40.5S", None), -40.5);
        assert_eq!(parse_lon("105 30 W", None), -105.5);
        assert_eq!(parse_lat("-33 15", Some(CoordinateFormat::DDM)), -33.25);
        assert!(parse_lat("95", None).is_nan());
        assert!(parse_lat("40E", None).is_nan());
        assert!(parse_lon("181", None).is_nan());
        assert!(parse_lon("", None).is_nan());
    }

    #[test]
    fn test_order_and_format_from_str() {
        assert_eq!("lon-first".parse::<CoordinateOrder>(), Ok(CoordinateOrder::LonFirst));
        assert_eq!("dms".parse::<CoordinateFormat>(), Ok(CoordinateFormat::DMS));
        assert!("xyz".parse::<CoordinateFormat>().is_err());
    }
}
