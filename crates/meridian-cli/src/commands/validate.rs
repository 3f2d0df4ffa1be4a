//! Validate command implementation

use crate::cli::GeometryArgs;
use crate::config_loader::load_config;
use crate::geometry_io::{read_geometry, render};
use crate::output::OutputWriter;
use crate::output_types::ValidateOutput;
use anyhow::Result;
use meridian_geo::TopologyAdapter;
use std::path::Path;

pub fn execute(args: GeometryArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_file)?;
    let adapter = TopologyAdapter::new(config.precision_tolerance.value);

    let geometry = read_geometry(&args.geometry)?;
    let (repaired, imprecise) = adapter.validate_with_report(&geometry, false);
    if imprecise {
        output.warning(format!(
            "Repair changed the perimeter by more than {}%",
            config.precision_tolerance.value * 100.0
        ));
    }

    let rendered = render(&repaired, args.wkt)?;
    if output.is_json() {
        output.result(ValidateOutput {
            geometry_type: repaired.geometry_type().to_string(),
            imprecise,
            geometry: rendered,
        })
    } else {
        match rendered {
            serde_json::Value::String(wkt) => println!("{}", wkt),
            other => println!("{}", other),
        }
        Ok(())
    }
}
