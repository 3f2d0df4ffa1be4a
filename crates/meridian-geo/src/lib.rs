//! Meridian Geo - the geodetic geometry engine
//!
//! Coordinate text parsing and formatting, extent math, antimeridian
//! splitting, geodesic/rhumb densification, CRS transforms, topology repair
//! and distance-accurate buffering. Geometry is the `meridian-core` model;
//! planar work is delegated to the `geo` crate.

pub mod antimeridian;
pub mod buffer;
pub mod extent;
pub mod frame;
pub mod interpolate;
pub mod measure;
pub mod models;
pub mod parse;
pub mod topology;
pub mod transform;
pub mod validation;

pub use buffer::{BufferEngine, BufferOptions};
pub use parse::{parse_lat, parse_lat_lon, parse_lon, CoordinateFormat, CoordinateOrder, LatLon};
pub use topology::TopologyAdapter;
