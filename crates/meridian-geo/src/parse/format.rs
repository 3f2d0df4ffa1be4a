//! Rendering decimal degrees as DD, DDM or DMS text with hemisphere letters.

use super::{CoordinateFormat, LatLon};

/// Fractional digits beyond this would overflow the integer rounding below.
const MAX_PRECISION: usize = 9;

pub fn format_lat(lat: f64, format: CoordinateFormat, precision: usize) -> String {
    format_value(lat, format, precision, ('N', 'S'))
}

pub fn format_lon(lon: f64, format: CoordinateFormat, precision: usize) -> String {
    format_value(lon, format, precision, ('E', 'W'))
}

/// `"<lat> <lon>"`, which [`super::parse_lat_lon`] reads back.
pub fn format_lat_lon(position: LatLon, format: CoordinateFormat, precision: usize) -> String {
    format!(
        "{} {}",
        format_lat(position.lat, format, precision),
        format_lon(position.lon, format, precision)
    )
}

fn format_value(value: f64, format: CoordinateFormat, precision: usize, letters: (char, char)) -> String {
    let precision = precision.min(MAX_PRECISION);
    let hemisphere = if value < 0.0 { letters.1 } else { letters.0 };
    let magnitude = value.abs();
    // Round once in the smallest unit shown so carries propagate upward.
    let scale = 10u64.pow(precision as u32);
    let width = if precision == 0 { 2 } else { precision + 3 };

    match format {
        CoordinateFormat::DD => format!("{:.*}°{}", precision, magnitude, hemisphere),
        CoordinateFormat::DDM => {
            let units = (magnitude * 60.0 * scale as f64).round() as u64;
            let per_degree = 60 * scale;
            let minutes = (units % per_degree) as f64 / scale as f64;
            format!(
                "{}°{:0width$.prec$}'{}",
                units / per_degree,
                minutes,
                hemisphere,
                width = width,
                prec = precision
            )
        }
        CoordinateFormat::DMS => {
            let units = (magnitude * 3600.0 * scale as f64).round() as u64;
            let per_degree = 3600 * scale;
            let per_minute = 60 * scale;
            let seconds = (units % per_minute) as f64 / scale as f64;
            format!(
                "{}°{:02}'{:0width$.prec$}\"{}",
                units / per_degree,
                (units % per_degree) / per_minute,
                seconds,
                hemisphere,
                width = width,
                prec = precision
            )
        }
    }
}
