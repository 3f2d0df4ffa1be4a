//! Extent math: clamping, widths, antimeridian tests and world-copy
//! normalization. All angles are degrees.

use crate::models::Extent;

/// Width of one world copy in degrees of longitude.
pub const WORLD_WIDTH: f64 = 360.0;

/// Clamp `extent` into `bounds`.
pub fn clamp(extent: &Extent, bounds: &Extent) -> Extent {
    Extent::new(
        extent.min_x.clamp(bounds.min_x, bounds.max_x),
        extent.min_y.clamp(bounds.min_y, bounds.max_y),
        extent.max_x.clamp(bounds.min_x, bounds.max_x),
        extent.max_y.clamp(bounds.min_y, bounds.max_y),
    )
}

/// Horizontal size of the extent.
pub fn width(extent: &Extent) -> f64 {
    extent.width()
}

/// Vertical size of the extent.
pub fn height(extent: &Extent) -> f64 {
    extent.height()
}

/// Shift `lon` by whole world widths into `[min, min + 360)`.
pub fn normalize_longitude(lon: f64, min: f64) -> f64 {
    if !lon.is_finite() {
        return lon;
    }
    let shifted = (lon - min).rem_euclid(WORLD_WIDTH) + min;
    // rem_euclid can round up to exactly the modulus
    if shifted >= min + WORLD_WIDTH {
        shifted - WORLD_WIDTH
    } else {
        shifted
    }
}

/// Shift `lon` into the ±180° window centered on `center`.
pub fn normalize_longitude_to_center(lon: f64, center: f64) -> f64 {
    normalize_longitude(lon, center - WORLD_WIDTH / 2.0)
}

/// Wrap `lon` into `[-180, 180]`, keeping 180 as 180.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        normalize_longitude(lon, -180.0)
    }
}

/// An extent crosses the antimeridian when it fits in one 360°-wide window
/// yet, once its left edge is placed in `[-180, 180)`, its right edge passes
/// 180°.
pub fn crosses_antimeridian(extent: &Extent) -> bool {
    if extent.is_empty() || extent.width() > WORLD_WIDTH {
        return false;
    }
    // min + width can round past 180 for an extent ending exactly there
    let min = normalize_longitude(extent.min_x, -180.0);
    extent.max_x + (min - extent.min_x) > 180.0
}

/// Shift the extent by whole world widths so its left edge lies in
/// `[min, min + 360)`.
pub fn normalize(extent: &Extent, min: f64) -> Extent {
    if extent.is_empty() || extent.width() >= WORLD_WIDTH {
        return *extent;
    }
    let target = normalize_longitude(extent.min_x, min);
    extent.shift_x(target - extent.min_x)
}

/// Window `[0, 360)`: crossing extents come out with positive longitudes,
/// e.g. `[170, 190]`.
pub fn normalize_anti_left(extent: &Extent) -> Extent {
    if crosses_antimeridian(extent) {
        normalize(extent, 0.0)
    } else {
        normalize(extent, -180.0)
    }
}

/// Window `[-360, 0)`: crossing extents come out with negative longitudes,
/// e.g. `[-190, -170]`.
pub fn normalize_anti_right(extent: &Extent) -> Extent {
    if crosses_antimeridian(extent) {
        normalize(extent, -WORLD_WIDTH)
    } else {
        normalize(extent, -180.0)
    }
}

/// Place the extent in the world copy whose center is nearest `center`.
pub fn normalize_to_center(extent: &Extent, center: f64) -> Extent {
    if extent.is_empty() || extent.width() >= WORLD_WIDTH {
        return *extent;
    }
    let mid = (extent.min_x + extent.max_x) / 2.0;
    let target = normalize_longitude_to_center(mid, center);
    extent.shift_x(target - mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp() {
        let extent = Extent::new(-200.0, -100.0, 10.0, 20.0);
        let clamped = clamp(&extent, &Extent::WORLD);
        assert_eq!(clamped.to_array(), [-180.0, -90.0, 10.0, 20.0]);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(190.0, -180.0), -170.0);
        assert_eq!(normalize_longitude(-190.0, -180.0), 170.0);
        assert_eq!(normalize_longitude(180.0, -180.0), -180.0);
        assert_eq!(normalize_longitude(-170.0, 0.0), 190.0);
        assert_eq!(normalize_longitude(725.0, -180.0), 5.0);
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(181.0), -179.0);
    }

    #[test]
    fn test_normalize_to_center() {
        assert_eq!(normalize_longitude_to_center(-170.0, 175.0), 190.0);
        assert_eq!(normalize_longitude_to_center(170.0, -175.0), -190.0);
        assert_eq!(normalize_longitude_to_center(10.0, 0.0), 10.0);
    }

    #[test]
    fn test_crosses_antimeridian() {
        assert!(!crosses_antimeridian(&Extent::WORLD));
        assert!(!crosses_antimeridian(&Extent::new(-10.0, 0.0, 10.0, 5.0)));
        assert!(crosses_antimeridian(&Extent::new(170.0, 0.0, 190.0, 5.0)));
        assert!(crosses_antimeridian(&Extent::new(-190.0, 0.0, -170.0, 5.0)));
        // Wholly inside the next world copy
        assert!(!crosses_antimeridian(&Extent::new(190.0, 0.0, 200.0, 5.0)));
        // Wider than a world
        assert!(!crosses_antimeridian(&Extent::new(-200.0, 0.0, 200.0, 5.0)));
        assert!(!crosses_antimeridian(&Extent::empty()));
    }

    #[test]
    fn test_extent_ending_on_date_line_does_not_cross() {
        assert!(!crosses_antimeridian(&Extent::new(170.1, -1.0, 180.0, 1.0)));
        assert!(!crosses_antimeridian(&Extent::new(177.843_946_593_691_02, -1.0, 180.0, 1.0)));
        assert!(!crosses_antimeridian(&Extent::new(-180.0, -1.0, 180.0, 1.0)));
    }

    #[test]
    fn test_normalize_variants() {
        let crossing = Extent::new(170.0, 0.0, 190.0, 5.0);
        assert_eq!(normalize_anti_left(&crossing).min_x, 170.0);
        assert_eq!(normalize_anti_right(&crossing).to_array(), [-190.0, 0.0, -170.0, 5.0]);
        assert_eq!(
            normalize_anti_left(&Extent::new(-190.0, 0.0, -170.0, 5.0)).to_array(),
            [170.0, 0.0, 190.0, 5.0]
        );

        let plain = Extent::new(370.0, 0.0, 380.0, 5.0);
        assert_eq!(normalize(&plain, -180.0).to_array(), [10.0, 0.0, 20.0, 5.0]);
        assert_eq!(normalize_anti_left(&plain).min_x, 10.0);

        assert_eq!(normalize_to_center(&plain, 0.0).min_x, 10.0);
        assert_eq!(
            normalize_to_center(&Extent::new(-175.0, 0.0, -165.0, 1.0), 170.0).to_array(),
            [185.0, 0.0, 195.0, 1.0]
        );
    }

    proptest! {
        #[test]
        fn prop_extent_inside_world_never_crosses(
            min in -180.0f64..180.0,
            w in 0.0f64..360.0,
        ) {
            let max = (min + w).min(180.0);
            prop_assert!(!crosses_antimeridian(&Extent::new(min, -1.0, max, 1.0)));
        }

        #[test]
        fn prop_straddling_extent_crosses(
            left in 0.001f64..179.0,
            right in 0.001f64..179.0,
        ) {
            let extent = Extent::new(180.0 - left, -1.0, 180.0 + right, 1.0);
            prop_assert!(crosses_antimeridian(&extent));
            prop_assert!(crosses_antimeridian(&extent.shift_x(-360.0)));
        }

        #[test]
        fn prop_normalized_longitude_in_window(lon in -1000.0f64..1000.0, min in -360.0f64..0.0) {
            let n = normalize_longitude(lon, min);
            prop_assert!(n >= min && n < min + 360.0);
            let turns = (lon - n) / 360.0;
            prop_assert!((turns - turns.round()).abs() < 1e-9);
        }
    }
}
