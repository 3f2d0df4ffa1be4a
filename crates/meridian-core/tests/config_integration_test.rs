//! Integration tests for layered configuration
//!
//! Loading follows the precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use meridian_core::config::{parse_distance_unit, CliConfigOverrides, ConfigSource, LayeredConfig};
use meridian_core::models::{DistanceUnit, InterpolationMethod};
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const ENV_VARS: [&str; 5] = [
    "MERIDIAN_CRS",
    "MERIDIAN_INTERPOLATION",
    "MERIDIAN_SPACING",
    "MERIDIAN_DISTANCE_UNIT",
    "MERIDIAN_SIMPLIFY_RATIO",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_default_configuration() {
    let config = LayeredConfig::with_defaults();

    assert_eq!(config.crs.value, 4326);
    assert_eq!(config.crs.source, ConfigSource::Default);
    assert_eq!(config.distance_unit.value, DistanceUnit::Meters);
    assert_eq!(config.interpolation.value, InterpolationMethod::Geodesic);
    assert_eq!(config.simplify_ratio.value, 0.01);
    assert_eq!(config.precision_tolerance.value, 0.005);
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
max_split_boxes = 1000
# Only the split limit, leave others as defaults
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.max_split_boxes.value, 1000);
    assert_eq!(config.max_split_boxes.source, ConfigSource::File);
    assert_eq!(config.crs.source, ConfigSource::Default);
    assert_eq!(config.spacing.source, ConfigSource::Default);
}

#[test]
fn test_out_of_range_ratio_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "precision_tolerance = 1.5").unwrap();

    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("MERIDIAN_CRS", "EPSG:3857");
    env::set_var("MERIDIAN_INTERPOLATION", "rhumb");
    env::set_var("MERIDIAN_SPACING", "5000");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
crs = 4326
interpolation = "none"
spacing = 20000.0
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.crs.value, 3857);
    assert_eq!(config.crs.source, ConfigSource::Environment);
    assert_eq!(config.interpolation.value, InterpolationMethod::Rhumb);
    assert_eq!(config.spacing.value, 5000.0);
    assert_eq!(config.spacing.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("MERIDIAN_SPACING", "-10");
    env::set_var("MERIDIAN_SIMPLIFY_RATIO", "2.0");
    env::set_var("MERIDIAN_INTERPOLATION", "zigzag");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.spacing.source, ConfigSource::Default);
    assert_eq!(config.simplify_ratio.source, ConfigSource::Default);
    assert_eq!(config.interpolation.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    env::set_var("MERIDIAN_CRS", "32748");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "crs = 3857").unwrap();

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    // At this point, environment should have overridden file
    assert_eq!(config.crs.value, 32748);
    assert_eq!(config.crs.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides { crs: Some(4326), ..Default::default() });

    assert_eq!(config.crs.value, 4326);
    assert_eq!(config.crs.source, ConfigSource::Cli);

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
fn test_configuration_source_tracking() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "crs = 3857\nsimplify_ratio = 0.05").unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
    let inspection_map = config.to_inspection_map();

    assert_eq!(inspection_map.len(), 7);

    let (crs_value, crs_source) = &inspection_map["crs"];
    assert_eq!(crs_value, "EPSG:3857");
    assert_eq!(*crs_source, ConfigSource::File);

    let (ratio_value, ratio_source) = &inspection_map["simplify_ratio"];
    assert_eq!(ratio_value, "0.05");
    assert_eq!(*ratio_source, ConfigSource::File);

    let (spacing_value, spacing_source) = &inspection_map["spacing"];
    assert_eq!(spacing_value, "100000 m");
    assert_eq!(*spacing_source, ConfigSource::Default);
}

#[test]
fn test_parse_distance_unit_variations() {
    assert_eq!(parse_distance_unit("M").unwrap(), DistanceUnit::Meters);
    assert_eq!(parse_distance_unit("km").unwrap(), DistanceUnit::Kilometers);
    assert_eq!(parse_distance_unit("mi").unwrap(), DistanceUnit::Miles);
    assert_eq!(parse_distance_unit("nautical miles").unwrap(), DistanceUnit::NauticalMiles);
    assert_eq!(parse_distance_unit("ft").unwrap(), DistanceUnit::Feet);
    assert!(parse_distance_unit("furlongs").is_err());
}

#[test]
fn test_invalid_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid toml content [[[").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());

    assert!(result.is_err());
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let non_existent = temp_dir.path().join("does_not_exist.toml");

    let result = LayeredConfig::with_defaults().load_from_file(&non_existent);

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_full_configuration_workflow() {
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("meridian.toml");
    fs::write(
        &config_path,
        r#"
crs = 3857
distance_unit = "Kilometers"
spacing = 50000.0
max_split_boxes = 200
"#,
    )
    .unwrap();

    env::set_var("MERIDIAN_DISTANCE_UNIT", "miles");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(&config_path)
        .unwrap()
        .load_from_env();

    assert_eq!(config.crs.value, 3857); // From file
    assert_eq!(config.distance_unit.value, DistanceUnit::Miles); // From env
    assert_eq!(config.distance_unit.source, ConfigSource::Environment);
    assert_eq!(config.max_split_boxes.value, 200); // From file

    config.update_from_cli(CliConfigOverrides {
        interpolation: Some(InterpolationMethod::Rhumb),
        spacing: Some(10_000.0),
        ..Default::default()
    });

    let interpolation = config.interpolation_config();
    assert_eq!(interpolation.method, InterpolationMethod::Rhumb);
    assert_eq!(interpolation.spacing, 10_000.0);
    assert_eq!(config.spacing.source, ConfigSource::Cli);
    assert_eq!(config.crs.source, ConfigSource::File);

    clear_env();
}
