use crate::error::{MeridianError, Result};
use crate::models::{DistanceUnit, InterpolationConfig, InterpolationMethod, DEFAULT_SPACING_METERS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Default ratio of the buffer distance used as simplification tolerance.
pub const DEFAULT_SIMPLIFY_RATIO: f64 = 0.01;

/// Default relative perimeter change above which a repair is flagged.
pub const DEFAULT_PRECISION_TOLERANCE: f64 = 0.005;

/// Default cap on the number of boxes a buffer may be split into.
pub const DEFAULT_MAX_SPLIT_BOXES: usize = 500;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the engine and CLI
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub crs: ConfigValue<u32>,
    pub interpolation: ConfigValue<InterpolationMethod>,
    pub spacing: ConfigValue<f64>,
    pub distance_unit: ConfigValue<DistanceUnit>,
    pub simplify_ratio: ConfigValue<f64>,
    pub precision_tolerance: ConfigValue<f64>,
    pub max_split_boxes: ConfigValue<usize>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            crs: ConfigValue::new(4326, ConfigSource::Default),
            interpolation: ConfigValue::new(InterpolationMethod::Geodesic, ConfigSource::Default),
            spacing: ConfigValue::new(DEFAULT_SPACING_METERS, ConfigSource::Default),
            distance_unit: ConfigValue::new(DistanceUnit::Meters, ConfigSource::Default),
            simplify_ratio: ConfigValue::new(DEFAULT_SIMPLIFY_RATIO, ConfigSource::Default),
            precision_tolerance: ConfigValue::new(
                DEFAULT_PRECISION_TOLERANCE,
                ConfigSource::Default,
            ),
            max_split_boxes: ConfigValue::new(DEFAULT_MAX_SPLIT_BOXES, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| MeridianError::ConfigFile {
            path: path.as_ref().to_path_buf(),
            reason: e.to_string(),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| MeridianError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(crs) = file_config.crs {
            self.crs.update(crs, ConfigSource::File);
        }

        if let Some(method) = file_config.interpolation {
            self.interpolation.update(method, ConfigSource::File);
        }

        if let Some(spacing) = file_config.spacing {
            self.spacing.update(validate_positive("spacing", spacing)?, ConfigSource::File);
        }

        if let Some(distance_unit) = file_config.distance_unit {
            self.distance_unit.update(distance_unit, ConfigSource::File);
        }

        if let Some(ratio) = file_config.simplify_ratio {
            self.simplify_ratio.update(validate_ratio("simplify_ratio", ratio)?, ConfigSource::File);
        }

        if let Some(tolerance) = file_config.precision_tolerance {
            self.precision_tolerance
                .update(validate_ratio("precision_tolerance", tolerance)?, ConfigSource::File);
        }

        if let Some(boxes) = file_config.max_split_boxes {
            self.max_split_boxes.update(boxes, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // MERIDIAN_CRS
        if let Ok(crs_str) = env::var("MERIDIAN_CRS") {
            match parse_crs(&crs_str) {
                Ok(crs) => self.crs.update(crs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid MERIDIAN_CRS value '{}': expected EPSG code such as 4326 or EPSG:3857",
                    crs_str
                ),
            }
        }

        // MERIDIAN_INTERPOLATION
        if let Ok(method_str) = env::var("MERIDIAN_INTERPOLATION") {
            match method_str.parse::<InterpolationMethod>() {
                Ok(method) => self.interpolation.update(method, ConfigSource::Environment),
                Err(e) => tracing::warn!("Invalid MERIDIAN_INTERPOLATION value: {}", e),
            }
        }

        // MERIDIAN_SPACING
        if let Ok(spacing_str) = env::var("MERIDIAN_SPACING") {
            match spacing_str.parse::<f64>().ok().filter(|s| *s > 0.0) {
                Some(spacing) => self.spacing.update(spacing, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid MERIDIAN_SPACING value '{}': expected positive meters",
                    spacing_str
                ),
            }
        }

        // MERIDIAN_DISTANCE_UNIT
        if let Ok(unit_str) = env::var("MERIDIAN_DISTANCE_UNIT") {
            match parse_distance_unit(&unit_str) {
                Ok(unit) => self.distance_unit.update(unit, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid MERIDIAN_DISTANCE_UNIT value '{}': expected meters, kilometers, miles, nautical miles, or feet",
                    unit_str
                ),
            }
        }

        // MERIDIAN_SIMPLIFY_RATIO
        if let Ok(ratio_str) = env::var("MERIDIAN_SIMPLIFY_RATIO") {
            match ratio_str.parse::<f64>().ok().filter(|r| (0.0..1.0).contains(r)) {
                Some(ratio) => self.simplify_ratio.update(ratio, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid MERIDIAN_SIMPLIFY_RATIO value '{}': expected a ratio in [0, 1)",
                    ratio_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(crs) = overrides.crs {
            self.crs.update(crs, ConfigSource::Cli);
        }

        if let Some(method) = overrides.interpolation {
            self.interpolation.update(method, ConfigSource::Cli);
        }

        if let Some(spacing) = overrides.spacing {
            self.spacing.update(spacing, ConfigSource::Cli);
        }

        if let Some(distance_unit) = overrides.distance_unit {
            self.distance_unit.update(distance_unit, ConfigSource::Cli);
        }
    }

    /// Interpolation configuration to thread through engine calls.
    pub fn interpolation_config(&self) -> InterpolationConfig {
        InterpolationConfig::new(self.interpolation.value, self.spacing.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("crs".to_string(), (format!("EPSG:{}", self.crs.value), self.crs.source));

        map.insert(
            "interpolation".to_string(),
            (self.interpolation.value.to_string(), self.interpolation.source),
        );

        map.insert(
            "spacing".to_string(),
            (format!("{} m", self.spacing.value), self.spacing.source),
        );

        map.insert(
            "distance_unit".to_string(),
            (format!("{:?}", self.distance_unit.value), self.distance_unit.source),
        );

        map.insert(
            "simplify_ratio".to_string(),
            (self.simplify_ratio.value.to_string(), self.simplify_ratio.source),
        );

        map.insert(
            "precision_tolerance".to_string(),
            (self.precision_tolerance.value.to_string(), self.precision_tolerance.source),
        );

        map.insert(
            "max_split_boxes".to_string(),
            (self.max_split_boxes.value.to_string(), self.max_split_boxes.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    crs: Option<u32>,
    interpolation: Option<InterpolationMethod>,
    spacing: Option<f64>,
    distance_unit: Option<DistanceUnit>,
    simplify_ratio: Option<f64>,
    precision_tolerance: Option<f64>,
    max_split_boxes: Option<usize>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub crs: Option<u32>,
    pub interpolation: Option<InterpolationMethod>,
    pub spacing: Option<f64>,
    pub distance_unit: Option<DistanceUnit>,
}

fn validate_positive(key: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MeridianError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("expected a positive value, got {}", value),
        })
    }
}

fn validate_ratio(key: &str, value: f64) -> Result<f64> {
    if (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(MeridianError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("expected a ratio in [0, 1), got {}", value),
        })
    }
}

/// Parse an EPSG code written as `4326` or `EPSG:4326`
pub fn parse_crs(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("EPSG:")
        .or_else(|| trimmed.strip_prefix("epsg:"))
        .unwrap_or(trimmed);
    digits.parse::<u32>().map_err(|_| MeridianError::ConfigInvalid {
        key: "crs".to_string(),
        reason: format!("Invalid EPSG code: {}", s),
    })
}

/// Parse distance unit from string
pub fn parse_distance_unit(s: &str) -> Result<DistanceUnit> {
    match s.to_lowercase().as_str() {
        "meters" | "m" => Ok(DistanceUnit::Meters),
        "kilometers" | "km" => Ok(DistanceUnit::Kilometers),
        "miles" | "mi" => Ok(DistanceUnit::Miles),
        "nautical miles" | "nauticalmiles" | "nmi" | "nm" => Ok(DistanceUnit::NauticalMiles),
        "feet" | "ft" => Ok(DistanceUnit::Feet),
        _ => Err(MeridianError::ConfigInvalid {
            key: "distance_unit".to_string(),
            reason: format!(
                "Invalid distance unit: {}. Use meters, kilometers, miles, nautical miles, or feet",
                s
            ),
        }),
    }
}
