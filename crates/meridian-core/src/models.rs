pub mod ellipsoid;
pub mod extent;
pub mod geometry;
pub mod interpolation;
pub mod units;

pub use ellipsoid::Ellipsoid;
pub use extent::Extent;
pub use geometry::{
    close_ring, is_closed, Coordinate, Feature, Geometry, GeometryType, Layout, Ring, Shape,
    EPSILON,
};
pub use interpolation::{
    InterpolationConfig, InterpolationContext, InterpolationMethod, ScopedConfig,
    DEFAULT_SPACING_METERS,
};
pub use units::{Crs, Distance, DistanceUnit};
