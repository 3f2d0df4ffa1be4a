//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use meridian_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// File picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "meridian.toml";

/// Config file to read: the explicit one, else `meridian.toml` when present.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

/// Load layered configuration: defaults, file, then environment
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_path(explicit) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    }
    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(explicit: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = load_config(explicit)?;
    config.update_from_cli(overrides);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::config::ConfigSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_explicit_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_split_boxes = 42").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.max_split_boxes.value, 42);
        assert_eq!(config.max_split_boxes.source, ConfigSource::File);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let err = load_config(Some(Path::new("/nonexistent/meridian.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/meridian.toml"));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = CliConfigOverrides { crs: Some(3857), ..Default::default() };
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "crs = 4326").unwrap();
        let config = load_config_with_overrides(Some(file.path()), overrides).unwrap();
        assert_eq!(config.crs.value, 3857);
        assert_eq!(config.crs.source, ConfigSource::Cli);
    }
}
