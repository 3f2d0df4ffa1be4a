//! CRS transformation between a host projection and geographic lon/lat.

use crate::models::{Coordinate, Crs, Geometry};
use meridian_core::error::{MeridianError, Result};
use proj::Proj;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Forward and inverse transform between a CRS and EPSG:4326.
///
/// Implementations must be shareable across the buffer worker pool.
pub trait Projection: Send + Sync + fmt::Debug {
    fn crs(&self) -> Crs;

    /// Host coordinate to lon/lat degrees. `z` and `m` pass through.
    fn to_lon_lat(&self, coord: &Coordinate) -> Result<Coordinate>;

    /// Lon/lat degrees to host coordinate. `z` and `m` pass through.
    fn from_lon_lat(&self, coord: &Coordinate) -> Result<Coordinate>;
}

/// EPSG:4326, the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84;

impl Projection for Wgs84 {
    fn crs(&self) -> Crs {
        Crs::wgs84()
    }

    fn to_lon_lat(&self, coord: &Coordinate) -> Result<Coordinate> {
        Ok(*coord)
    }

    fn from_lon_lat(&self, coord: &Coordinate) -> Result<Coordinate> {
        Ok(*coord)
    }
}

/// Any CRS PROJ knows, through a pair of PROJ pipelines.
pub struct ProjProjection {
    crs: Crs,
    forward: Mutex<Proj>,
    inverse: Mutex<Proj>,
}

// SAFETY: each `Proj` owns its own PROJ context and is only reached through
// a `Mutex`, so it is never used from two threads at once.
unsafe impl Send for ProjProjection {}
unsafe impl Sync for ProjProjection {}

impl fmt::Debug for ProjProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjProjection").field("crs", &self.crs).finish()
    }
}

fn projection_error(e: impl fmt::Display) -> MeridianError {
    MeridianError::Projection { reason: e.to_string() }
}

impl ProjProjection {
    pub fn new(crs: &Crs) -> Result<Self> {
        let code = crs.code();
        let inverse = Proj::new_known_crs(&code, "EPSG:4326", None)
            .map_err(|_| MeridianError::UnknownCrs { epsg: crs.epsg })?;
        let forward = Proj::new_known_crs("EPSG:4326", &code, None)
            .map_err(|_| MeridianError::UnknownCrs { epsg: crs.epsg })?;
        Ok(Self { crs: crs.clone(), forward: Mutex::new(forward), inverse: Mutex::new(inverse) })
    }

    fn convert(proj: &Mutex<Proj>, coord: &Coordinate) -> Result<Coordinate> {
        let guard = proj.lock().map_err(projection_error)?;
        let (x, y) = guard.convert((coord.x, coord.y)).map_err(projection_error)?;
        Ok(coord.with_xy(x, y))
    }
}

impl Projection for ProjProjection {
    fn crs(&self) -> Crs {
        self.crs.clone()
    }

    fn to_lon_lat(&self, coord: &Coordinate) -> Result<Coordinate> {
        Self::convert(&self.inverse, coord)
    }

    fn from_lon_lat(&self, coord: &Coordinate) -> Result<Coordinate> {
        Self::convert(&self.forward, coord)
    }
}

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// Resolve the projection for a CRS.
pub fn projection_for(crs: &Crs) -> Result<Arc<dyn Projection>> {
    match crs.epsg {
        4326 => Ok(Arc::new(Wgs84)),
        _ => Ok(Arc::new(ProjProjection::new(crs)?)),
    }
}

/// Apply a fallible coordinate transform to a copy of `geometry`.
pub fn map_coords<F>(geometry: &Geometry, mut f: F) -> Result<Geometry>
where
    F: FnMut(&Coordinate) -> Result<Coordinate>,
{
    let mut out = geometry.clone();
    let mut failure = None;
    out.for_each_coord_mut(&mut |c| {
        if failure.is_some() {
            return;
        }
        match f(c) {
            Ok(mapped) => *c = mapped,
            Err(e) => failure = Some(e),
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

pub fn to_lon_lat_geometry(geometry: &Geometry, projection: &dyn Projection) -> Result<Geometry> {
    map_coords(geometry, |c| projection.to_lon_lat(c))
}

pub fn from_lon_lat_geometry(geometry: &Geometry, projection: &dyn Projection) -> Result<Geometry> {
    map_coords(geometry, |c| projection.from_lon_lat(c))
}

/// The host ⇄ lon/lat projection for the last CRS asked for. Asking for a
/// different CRS rebuilds it; asking again for the same one is free.
#[derive(Debug, Default)]
pub struct TransformCache {
    current: Option<(Crs, Arc<dyn Projection>)>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, crs: &Crs) -> Result<Arc<dyn Projection>> {
        if let Some((cached, projection)) = &self.current {
            if crs_match(cached, crs) {
                return Ok(Arc::clone(projection));
            }
        }
        debug!(crs = %crs.code(), "Building projection");
        let projection = projection_for(crs)?;
        self.current = Some((crs.clone(), Arc::clone(&projection)));
        Ok(projection)
    }

    /// CRS of the cached projection, if any.
    pub fn cached_crs(&self) -> Option<&Crs> {
        self.current.as_ref().map(|(crs, _)| crs)
    }
}
