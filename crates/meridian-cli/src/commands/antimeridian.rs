//! Date-line commands: crosses, split and merge

use crate::cli::GeometryArgs;
use crate::geometry_io::{read_geometry, render};
use crate::output::OutputWriter;
use crate::output_types::{CrossesOutput, GeometryOutput};
use anyhow::Result;
use meridian_core::models::Geometry;
use meridian_geo::antimeridian::{crosses_date_line, merge_line_geometry, split_on_date_line};

pub fn crosses(args: GeometryArgs, output: &OutputWriter) -> Result<()> {
    let geometry = read_geometry(&args.geometry)?;
    let crosses = crosses_date_line(&geometry);

    if output.is_json() {
        output.result(CrossesOutput { geometry_type: geometry.geometry_type().to_string(), crosses })
    } else {
        if crosses {
            output.info(format!("{} crosses the date line", geometry.geometry_type()));
        } else {
            output.info(format!("{} does not cross the date line", geometry.geometry_type()));
        }
        Ok(())
    }
}

pub fn split(args: GeometryArgs, output: &OutputWriter) -> Result<()> {
    let geometry = read_geometry(&args.geometry)?;
    let split = split_on_date_line(&geometry);
    print_geometry(&split, args.wkt, output)
}

pub fn merge(args: GeometryArgs, output: &OutputWriter) -> Result<()> {
    let geometry = read_geometry(&args.geometry)?;
    let merged = merge_line_geometry(&geometry);
    print_geometry(&merged, args.wkt, output)
}

/// Print a geometry result: the bare GeoJSON/WKT in human mode.
pub(crate) fn print_geometry(geometry: &Geometry, as_wkt: bool, output: &OutputWriter) -> Result<()> {
    let rendered = render(geometry, as_wkt)?;
    let text = match &rendered {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    output.text_or_result(
        text,
        GeometryOutput {
            geometry_type: geometry.geometry_type().to_string(),
            vertices: geometry.coord_count(),
            geometry: rendered,
        },
    )
}
