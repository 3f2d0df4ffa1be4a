//! Format command implementation

use crate::cli::FormatArgs;
use crate::output::OutputWriter;
use crate::output_types::FormatOutput;
use anyhow::{bail, Result};
use meridian_geo::parse::{format_lat, format_lat_lon, format_lon, CoordinateFormat};
use meridian_geo::LatLon;

pub fn execute(args: FormatArgs, output: &OutputWriter) -> Result<()> {
    if !(args.lat.abs() <= 90.0 && args.lon.abs() <= 180.0) {
        bail!("Position out of range: latitude {} longitude {}", args.lat, args.lon);
    }
    let format = CoordinateFormat::from(args.format);
    let text = format_lat_lon(LatLon::new(args.lat, args.lon), format, args.precision);

    output.text_or_result(
        &text,
        FormatOutput {
            lat: format_lat(args.lat, format, args.precision),
            lon: format_lon(args.lon, format, args.precision),
            text: text.clone(),
        },
    )
}
