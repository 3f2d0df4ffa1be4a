use clap::{Parser, Subcommand, ValueEnum};
use meridian_core::models::InterpolationMethod;
use meridian_geo::parse::{CoordinateFormat, CoordinateOrder};
use std::path::PathBuf;

/// Meridian - geodetic geometry toolkit
#[derive(Parser, Debug)]
#[command(name = "meridian")]
#[command(about = "Coordinate parsing, date-line handling and geodesic buffers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./meridian.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a latitude/longitude pair written as DD, DDM or DMS
    Parse(ParseArgs),

    /// Format a latitude/longitude pair as DD, DDM or DMS text
    Format(FormatArgs),

    /// Report whether a geometry crosses the date line
    Crosses(GeometryArgs),

    /// Split a geometry at the date line
    Split(GeometryArgs),

    /// Rejoin line pieces split at the date line
    Merge(GeometryArgs),

    /// Densify lines along geodesic or rhumb paths
    Interpolate(InterpolateArgs),

    /// Buffer a geometry by a distance on the ellipsoid
    Buffer(BufferArgs),

    /// Repair polygon topology
    Validate(GeometryArgs),

    /// Distance and bearing between two positions
    Distance(DistanceArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

/// Coordinate notation accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatChoice {
    Dd,
    Ddm,
    Dms,
}

impl From<FormatChoice> for CoordinateFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Dd => CoordinateFormat::DD,
            FormatChoice::Ddm => CoordinateFormat::DDM,
            FormatChoice::Dms => CoordinateFormat::DMS,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderChoice {
    LatFirst,
    LonFirst,
}

impl From<OrderChoice> for CoordinateOrder {
    fn from(choice: OrderChoice) -> Self {
        match choice {
            OrderChoice::LatFirst => CoordinateOrder::LatFirst,
            OrderChoice::LonFirst => CoordinateOrder::LonFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodChoice {
    Geodesic,
    Rhumb,
    None,
}

impl From<MethodChoice> for InterpolationMethod {
    fn from(choice: MethodChoice) -> Self {
        match choice {
            MethodChoice::Geodesic => InterpolationMethod::Geodesic,
            MethodChoice::Rhumb => InterpolationMethod::Rhumb,
            MethodChoice::None => InterpolationMethod::None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DistanceMethod {
    Geodesic,
    Rhumb,
    Vincenty,
}

#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Coordinate text, e.g. "40°26'46\"N 79°58'56\"W"
    pub text: String,

    /// Value order when the text has no hemisphere letters
    #[arg(long)]
    pub order: Option<OrderChoice>,

    /// Only try this notation
    #[arg(long)]
    pub format: Option<FormatChoice>,
}

#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Latitude in decimal degrees
    #[arg(allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(allow_hyphen_values = true)]
    pub lon: f64,

    #[arg(long, default_value = "dms")]
    pub format: FormatChoice,

    /// Fractional digits of the smallest unit shown
    #[arg(long, default_value = "2")]
    pub precision: usize,
}

#[derive(Parser, Debug)]
pub struct GeometryArgs {
    /// GeoJSON or WKT text, or a path to a file containing either
    pub geometry: String,

    /// Print the result as WKT instead of GeoJSON
    #[arg(long)]
    pub wkt: bool,
}

#[derive(Parser, Debug)]
pub struct InterpolateArgs {
    #[command(flatten)]
    pub input: GeometryArgs,

    /// Path followed between vertices (defaults to the configured method)
    #[arg(long)]
    pub method: Option<MethodChoice>,

    /// Largest gap between vertices, e.g. "50km" (defaults to the configured spacing)
    #[arg(long)]
    pub spacing: Option<String>,
}

#[derive(Parser, Debug)]
pub struct BufferArgs {
    #[command(flatten)]
    pub input: GeometryArgs,

    /// Buffer distance, e.g. "10km" or "-500m"; bare numbers use the configured unit
    #[arg(long, allow_hyphen_values = true)]
    pub distance: String,

    /// CRS of the input geometry (EPSG code); defaults to the configured CRS
    #[arg(long)]
    pub crs: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DistanceArgs {
    #[arg(allow_hyphen_values = true)]
    pub lat1: f64,
    #[arg(allow_hyphen_values = true)]
    pub lon1: f64,
    #[arg(allow_hyphen_values = true)]
    pub lat2: f64,
    #[arg(allow_hyphen_values = true)]
    pub lon2: f64,

    #[arg(long, default_value = "geodesic")]
    pub method: DistanceMethod,
}
