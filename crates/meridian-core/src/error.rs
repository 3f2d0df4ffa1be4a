//! Error types for Meridian

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeridianError {
    // Geometry errors
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("Unsupported geometry type {geometry_type} for {operation}")]
    UnsupportedGeometry {
        geometry_type: String,
        operation: String,
    },

    #[error("Geometry is empty")]
    EmptyGeometry,

    // Projection errors
    #[error("Unknown CRS: EPSG:{epsg}")]
    UnknownCrs { epsg: u32 },

    #[error("Projection failed: {reason}")]
    Projection { reason: String },

    // Engine errors
    #[error("Topology operation '{operation}' failed: {reason}")]
    Topology { operation: String, reason: String },

    #[error("Buffer of {distance} m exceeds the accuracy limit of {limit} m")]
    AccuracyLimit { distance: f64, limit: f64 },

    #[error("Cannot split geometry for buffering: {reason}")]
    CannotSplit { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Configuration file not readable at {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MeridianError {
    /// Shorthand for a topology failure raised while running `operation`.
    pub fn topology(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        MeridianError::Topology { operation: operation.into(), reason: reason.into() }
    }

    /// Shorthand for an unsupported geometry type.
    pub fn unsupported(geometry_type: impl Into<String>, operation: impl Into<String>) -> Self {
        MeridianError::UnsupportedGeometry {
            geometry_type: geometry_type.into(),
            operation: operation.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MeridianError>;
