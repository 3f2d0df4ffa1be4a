//! Buffer command implementation

use super::parse_distance;
use crate::cli::BufferArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors::buffer_refused;
use crate::geometry_io::{read_geometry, render};
use crate::output::OutputWriter;
use crate::output_types::BufferOutput;
use anyhow::Result;
use meridian_core::config::{parse_crs, CliConfigOverrides};
use meridian_geo::BufferEngine;
use std::path::Path;

pub fn execute(args: BufferArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let overrides = CliConfigOverrides {
        crs: args.crs.as_deref().map(parse_crs).transpose()?,
        ..Default::default()
    };
    let config = load_config_with_overrides(config_file, overrides)?;
    let distance = parse_distance(&args.distance, config.distance_unit.value)?.to_meters();
    let engine = BufferEngine::from_config(&config)?;

    let geometry = read_geometry(&args.input.geometry)?;
    let buffered = engine
        .try_buffer(&geometry, distance, false)
        .map_err(|e| buffer_refused(&e))?;

    let crs = format!("EPSG:{}", config.crs.value);
    match buffered {
        Some(result) => {
            let rendered = render(&result, args.input.wkt)?;
            if output.is_json() {
                output.result(BufferOutput { distance_meters: distance, crs, geometry: Some(rendered) })
            } else {
                match rendered {
                    serde_json::Value::String(wkt) => println!("{}", wkt),
                    other => println!("{}", other),
                }
                Ok(())
            }
        }
        None => {
            output.warning(format!(
                "Buffer of {} m left nothing (zero distance, inward buffer of a point or line, or full collapse)",
                distance
            ));
            if output.is_json() {
                output.result(BufferOutput { distance_meters: distance, crs, geometry: None })?;
            }
            Ok(())
        }
    }
}
