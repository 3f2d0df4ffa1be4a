//! Distances on the ellipsoid: geodesic and rhumb through `geo`, and the
//! legacy Vincenty formulae for callers pinned to a specific ellipsoid.

use crate::models::{Coordinate, Ellipsoid};
use geo::{Distance, Geodesic, Point, Rhumb};

/// Iteration cap for the Vincenty formulae.
const VINCENTY_MAX_ITERATIONS: usize = 200;
const VINCENTY_CONVERGENCE: f64 = 1e-12;

fn point(c: &Coordinate) -> Point<f64> {
    Point::new(c.x, c.y)
}

/// Geodesic distance in meters between two lon/lat coordinates (WGS84).
pub fn geodesic_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    Geodesic.distance(point(a), point(b))
}

/// Rhumb-line distance in meters between two lon/lat coordinates.
pub fn rhumb_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    Rhumb.distance(point(a), point(b))
}

/// Geodesic length of a ring or line in meters.
pub fn geodesic_perimeter(ring: &[Coordinate]) -> f64 {
    ring.windows(2).map(|w| geodesic_distance(&w[0], &w[1])).sum()
}

/// Result of [`vincenty_inverse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inverse {
    pub distance: f64,
    /// Azimuth at `a`, degrees clockwise from north.
    pub initial_bearing: f64,
    /// Azimuth at `b`.
    pub final_bearing: f64,
}

/// Vincenty's inverse formula. `None` when the iteration does not converge,
/// which happens for nearly antipodal points.
pub fn vincenty_inverse(a: &Coordinate, b: &Coordinate, ellipsoid: &Ellipsoid) -> Option<Inverse> {
    let Ellipsoid { a: major, b: minor, f } = *ellipsoid;
    let l = (b.x - a.x).to_radians();
    let u1 = ((1.0 - f) * a.y.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * b.y.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut iterations = 0;
    let (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m, sin_lambda, cos_lambda) = loop {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(Inverse { distance: 0.0, initial_bearing: 0.0, final_bearing: 0.0 });
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line: cos²α = 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
        iterations += 1;
        if (lambda - previous).abs() < VINCENTY_CONVERGENCE {
            break (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m, sin_lambda, cos_lambda);
        }
        if iterations >= VINCENTY_MAX_ITERATIONS {
            return None;
        }
    };

    let u_sq = cos_sq_alpha * (major * major - minor * minor) / (minor * minor);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
    let distance = minor * big_a * (sigma - delta_sigma);

    let initial = (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
    let final_ = (cos_u1 * sin_lambda).atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda);
    Some(Inverse {
        distance,
        initial_bearing: initial.to_degrees().rem_euclid(360.0),
        final_bearing: final_.to_degrees().rem_euclid(360.0),
    })
}

/// Vincenty's direct formula: the point `distance` meters from `origin`
/// along initial `bearing` (degrees clockwise from north).
pub fn vincenty_direct(origin: &Coordinate, bearing: f64, distance: f64, ellipsoid: &Ellipsoid) -> Coordinate {
    let Ellipsoid { a: major, b: minor, f } = *ellipsoid;
    let (sin_alpha1, cos_alpha1) = bearing.to_radians().sin_cos();

    let tan_u1 = (1.0 - f) * origin.y.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;
    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (major * major - minor * minor) / (minor * minor);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let mut sigma = distance / (minor * big_a);
    let mut cos_2sigma_m;
    let mut sin_sigma;
    let mut cos_sigma;
    let mut iterations = 0;
    loop {
        cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        sin_sigma = sigma.sin();
        cos_sigma = sigma.cos();
        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
        let previous = sigma;
        sigma = distance / (minor * big_a) + delta_sigma;
        iterations += 1;
        if (sigma - previous).abs() < VINCENTY_CONVERGENCE || iterations >= VINCENTY_MAX_ITERATIONS {
            break;
        }
    }

    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma + c * sin_sigma * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    origin.with_xy(origin.x + l.to_degrees(), lat.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_geodesic_distance() {
        // One degree of longitude on the equator
        let d = geodesic_distance(&Coordinate::new(0.0, 0.0), &Coordinate::new(1.0, 0.0));
        assert_relative_eq!(d, 111_319.490_793, epsilon = 1e-3);
    }

    #[test]
    fn test_rhumb_longer_than_geodesic_off_equator() {
        let a = Coordinate::new(-70.0, 45.0);
        let b = Coordinate::new(10.0, 50.0);
        assert!(rhumb_distance(&a, &b) > geodesic_distance(&a, &b));
    }

    #[test]
    fn test_vincenty_matches_geodesic() {
        // Flinders Peak to Buninyong, the classic Vincenty example
        let a = Coordinate::new(144.424_867_888_9, -37.951_033_416_7);
        let b = Coordinate::new(143.926_495_527_8, -37.652_821_138_9);
        let inverse = vincenty_inverse(&a, &b, &Ellipsoid::WGS84).unwrap();
        assert_relative_eq!(inverse.distance, 54_972.271, epsilon = 1e-2);
        assert_relative_eq!(inverse.distance, geodesic_distance(&a, &b), epsilon = 1e-3);
        assert_relative_eq!(inverse.initial_bearing, 306.868_159, epsilon = 1e-5);
    }

    #[test]
    fn test_vincenty_direct_inverts_inverse() {
        let a = Coordinate::xyz(10.0, 50.0, 5.0);
        let b = vincenty_direct(&a, 45.0, 100_000.0, &Ellipsoid::WGS84);
        assert_eq!(b.z, 5.0);
        let inverse = vincenty_inverse(&a, &b, &Ellipsoid::WGS84).unwrap();
        assert_relative_eq!(inverse.distance, 100_000.0, epsilon = 1e-4);
        assert_relative_eq!(inverse.initial_bearing, 45.0, epsilon = 1e-8);
    }

    #[test]
    fn test_vincenty_coincident_points() {
        let p = Coordinate::new(5.0, 5.0);
        assert_eq!(vincenty_inverse(&p, &p, &Ellipsoid::WGS84).unwrap().distance, 0.0);
    }

    #[test]
    fn test_perimeter() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let perimeter = geodesic_perimeter(&ring);
        assert!(perimeter > 4.0 * 110_000.0 && perimeter < 4.0 * 112_000.0);
    }
}
