//! Command implementations

mod antimeridian;
mod buffer;
mod config;
mod distance;
mod format;
mod interpolate;
mod parse;
mod validate;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::{bail, Context, Result};
use meridian_core::models::{Distance, DistanceUnit};

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Parse(args) => parse::execute(args, &output),
        Commands::Format(args) => format::execute(args, &output),
        Commands::Crosses(args) => antimeridian::crosses(args, &output),
        Commands::Split(args) => antimeridian::split(args, &output),
        Commands::Merge(args) => antimeridian::merge(args, &output),
        Commands::Interpolate(args) => interpolate::execute(args, config_file, &output),
        Commands::Buffer(args) => buffer::execute(args, config_file, &output),
        Commands::Validate(args) => validate::execute(args, config_file, &output),
        Commands::Distance(args) => distance::execute(args, config_file, &output),
        Commands::Config => config::execute(config_file, &output),
    }
}

/// Parse a distance string like "5km", "-500 m" or "12"; bare numbers take
/// `default_unit`.
pub(crate) fn parse_distance(dist_str: &str, default_unit: DistanceUnit) -> Result<Distance> {
    let dist_str = dist_str.trim();

    let (value_str, unit_str) = if let Some(pos) = dist_str.find(|c: char| c.is_alphabetic()) {
        (dist_str[..pos].trim(), dist_str[pos..].trim())
    } else {
        (dist_str, "")
    };

    let value: f64 = value_str
        .parse()
        .with_context(|| format!("Invalid distance value: {}", dist_str))?;
    if !value.is_finite() {
        bail!("Invalid distance value: {}", dist_str);
    }

    let unit = if unit_str.is_empty() {
        default_unit
    } else {
        match unit_str.to_lowercase().as_str() {
            "m" | "meters" | "meter" => DistanceUnit::Meters,
            "km" | "kilometers" | "kilometer" => DistanceUnit::Kilometers,
            "mi" | "miles" | "mile" => DistanceUnit::Miles,
            "nmi" | "nm" => DistanceUnit::NauticalMiles,
            "ft" | "feet" | "foot" => DistanceUnit::Feet,
            _ => bail!("Invalid distance unit: {}", unit_str),
        }
    };

    Ok(Distance::new(value, unit))
}
