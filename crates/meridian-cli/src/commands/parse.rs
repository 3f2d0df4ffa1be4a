//! Parse command implementation

use crate::cli::ParseArgs;
use crate::errors::coordinate_unparsed;
use crate::output::OutputWriter;
use crate::output_types::ParseOutput;
use anyhow::Result;
use meridian_geo::parse_lat_lon;

pub fn execute(args: ParseArgs, output: &OutputWriter) -> Result<()> {
    let position = parse_lat_lon(&args.text, args.order.map(Into::into), args.format.map(Into::into))
        .ok_or_else(|| coordinate_unparsed(&args.text))?;

    if output.is_json() {
        output.result(ParseOutput { input: args.text, lat: position.lat, lon: position.lon })?;
    } else {
        output.kv("Latitude", position.lat);
        output.kv("Longitude", position.lon);
    }
    Ok(())
}
