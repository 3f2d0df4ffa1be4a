//! Interpolate command implementation

use super::antimeridian::print_geometry;
use super::parse_distance;
use crate::cli::InterpolateArgs;
use crate::config_loader::load_config_with_overrides;
use crate::geometry_io::read_geometry;
use crate::output::OutputWriter;
use anyhow::{bail, Context, Result};
use meridian_core::config::CliConfigOverrides;
use meridian_core::models::{Crs, DistanceUnit};
use meridian_geo::interpolate::interpolate_geometry;
use meridian_geo::transform::TransformCache;
use std::path::Path;

pub fn execute(args: InterpolateArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let spacing = match args.spacing.as_deref() {
        Some(text) => {
            let meters = parse_distance(text, DistanceUnit::Meters)?.to_meters();
            if meters <= 0.0 {
                bail!("Spacing must be positive, got {}", text);
            }
            Some(meters)
        }
        None => None,
    };
    let overrides = CliConfigOverrides {
        interpolation: args.method.map(Into::into),
        spacing,
        ..Default::default()
    };
    let config = load_config_with_overrides(config_file, overrides)?;
    let interpolation = config.interpolation_config();
    let mut transforms = TransformCache::new();
    let projection = transforms.get(&Crs::new(config.crs.value, format!("EPSG:{}", config.crs.value)))?;

    let mut geometry = read_geometry(&args.input.geometry)?;
    let before = geometry.coord_count();
    interpolate_geometry(&mut geometry, &interpolation, projection.as_ref())
        .context("Interpolation failed")?;
    tracing::debug!(
        method = %interpolation.method,
        spacing = interpolation.spacing,
        before,
        after = geometry.coord_count(),
        "Interpolated geometry"
    );

    print_geometry(&geometry, args.input.wkt, output)
}
