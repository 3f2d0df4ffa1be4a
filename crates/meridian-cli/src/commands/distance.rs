//! Distance command implementation

use crate::cli::{DistanceArgs, DistanceMethod};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::DistanceOutput;
use anyhow::{anyhow, bail, Result};
use geo::{Bearing, Geodesic, Point, Rhumb};
use meridian_core::models::{Coordinate, Ellipsoid};
use meridian_geo::measure::{geodesic_distance, rhumb_distance, vincenty_inverse};
use std::path::Path;

pub fn execute(args: DistanceArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    for (lat, lon) in [(args.lat1, args.lon1), (args.lat2, args.lon2)] {
        if !(lat.abs() <= 90.0 && lon.abs() <= 180.0) {
            bail!("Position out of range: latitude {} longitude {}", lat, lon);
        }
    }
    let config = load_config(config_file)?;
    let unit = config.distance_unit.value;

    let a = Coordinate::new(args.lon1, args.lat1);
    let b = Coordinate::new(args.lon2, args.lat2);
    let (pa, pb) = (Point::new(a.x, a.y), Point::new(b.x, b.y));

    let (method, meters, initial, last) = match args.method {
        DistanceMethod::Geodesic => ("geodesic", geodesic_distance(&a, &b), Some(Geodesic.bearing(pa, pb)), None),
        DistanceMethod::Rhumb => ("rhumb", rhumb_distance(&a, &b), Some(Rhumb.bearing(pa, pb)), None),
        DistanceMethod::Vincenty => {
            let inverse = vincenty_inverse(&a, &b, &Ellipsoid::WGS84)
                .ok_or_else(|| anyhow!("Vincenty did not converge; the points are nearly antipodal"))?;
            ("vincenty", inverse.distance, Some(inverse.initial_bearing), Some(inverse.final_bearing))
        }
    };

    if output.is_json() {
        output.result(DistanceOutput {
            method: method.to_string(),
            meters,
            distance: unit.from_meters(meters),
            unit: unit.symbol().to_string(),
            initial_bearing: initial,
            final_bearing: last,
        })
    } else {
        output.kv("Method", method);
        output.kv("Distance", format!("{:.3} {}", unit.from_meters(meters), unit.symbol()));
        if let Some(bearing) = initial {
            output.kv("Initial bearing", format!("{:.6}°", bearing));
        }
        if let Some(bearing) = last {
            output.kv("Final bearing", format!("{:.6}°", bearing));
        }
        Ok(())
    }
}
