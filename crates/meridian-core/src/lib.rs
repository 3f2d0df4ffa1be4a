//! Meridian Core - Geometry value objects, errors, and configuration
//!
//! This crate contains the value objects shared by the geodetic engine and
//! its front-ends. Nothing here is long-lived: callers own every input and
//! output.

pub mod config;
pub mod error;
pub mod models;

pub use error::{MeridianError, Result};
