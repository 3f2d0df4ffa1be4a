//! Properties of the buffer engine and geometry repair.

use geo::{Distance, Geodesic, Point};
use meridian_core::models::{Coordinate, Geometry, InterpolationConfig, Shape};
use meridian_geo::interpolate::interpolate_line;
use meridian_geo::measure::geodesic_perimeter;
use meridian_geo::transform::Wgs84;
use meridian_geo::{BufferEngine, TopologyAdapter};
use proptest::prelude::*;

fn rings(geometry: &Geometry) -> Vec<Vec<[f64; 2]>> {
    match &geometry.shape {
        Shape::Polygon(rings) => rings.iter().map(|r| r.iter().map(|c| [c.x, c.y]).collect()).collect(),
        Shape::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .map(|r| r.iter().map(|c| [c.x, c.y]).collect())
            .collect(),
        other => panic!("expected polygons, got {:?}", other),
    }
}

/// `path` with geodesic vertices inserted every `spacing` meters.
fn geodesic_path(path: &[[f64; 2]], spacing: f64) -> Vec<Coordinate> {
    let mut coords: Vec<Coordinate> = path.iter().map(|c| Coordinate::new(c[0], c[1])).collect();
    interpolate_line(&mut coords, &InterpolationConfig::geodesic().with_spacing(spacing), &Wgs84).unwrap();
    coords
}

/// Geodesic distance from `c` to the nearest vertex of a finely densified
/// `source`. The nearest candidate is found with a flat approximation and
/// refined over its neighbours.
fn distance_to_path(c: [f64; 2], source: &[Coordinate]) -> f64 {
    let flat = |s: &Coordinate| {
        let dx = (s.x - c[0]) * s.y.to_radians().cos();
        let dy = s.y - c[1];
        dx * dx + dy * dy
    };
    let nearest = (0..source.len())
        .min_by(|&a, &b| flat(&source[a]).total_cmp(&flat(&source[b])))
        .unwrap();
    let lo = nearest.saturating_sub(8);
    let hi = (nearest + 8).min(source.len() - 1);
    source[lo..=hi]
        .iter()
        .map(|s| Geodesic.distance(Point::new(c[0], c[1]), Point::new(s.x, s.y)))
        .fold(f64::INFINITY, f64::min)
}

/// Every output vertex lies within 0.5% of `distance` of the source.
fn assert_vertices_on_offset(result: &Geometry, source: &[Coordinate], distance: f64) {
    let d = distance.abs();
    for c in rings(result).concat() {
        let offset = distance_to_path(c, source);
        assert!(
            (offset - d).abs() <= d * 0.005 + 10.0,
            "vertex ({}, {}) is {} m from the source, wanted {} m",
            c[0],
            c[1],
            offset,
            d
        );
    }
}

fn geometry_strategy() -> impl Strategy<Value = Geometry> {
    let xy = (-170.0f64..170.0, -70.0f64..70.0);
    prop_oneof![
        xy.clone().prop_map(|(x, y)| Geometry::point(x, y)),
        proptest::collection::vec(xy.clone(), 2..6)
            .prop_map(|c| Geometry::line_string(c.into_iter().map(|(x, y)| [x, y]).collect())),
        (xy, 0.1f64..3.0).prop_map(|((x, y), s)| Geometry::polygon(vec![vec![
            [x, y],
            [x + s, y],
            [x + s, y + s],
            [x, y + s],
            [x, y],
        ]])),
    ]
}

#[test]
fn test_multi_point_buffers_merge_when_close() {
    let engine = BufferEngine::default();
    let points = Geometry::multi_point(vec![[10.0, 10.0], [10.1, 10.0]]);
    let result = engine.buffer(&points, 20_000.0, true).unwrap();
    assert_eq!(rings(&result).len(), 1);

    let apart = Geometry::multi_point(vec![[10.0, 10.0], [20.0, 10.0]]);
    let result = engine.buffer(&apart, 20_000.0, true).unwrap();
    assert!(matches!(result.shape, Shape::MultiPolygon(ref p) if p.len() == 2));
}

#[test]
fn test_polygon_with_hole_inward_buffer_widens_hole() {
    let engine = BufferEngine::default();
    let polygon = Geometry::polygon(vec![
        vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
        vec![[1.5, 1.5], [1.5, 2.5], [2.5, 2.5], [2.5, 1.5], [1.5, 1.5]],
    ]);
    let result = engine.buffer(&polygon, -10_000.0, true).unwrap();
    let result_rings = rings(&result);
    assert_eq!(result_rings.len(), 2);
    let hole_min_x = result_rings[1].iter().map(|c| c[0]).fold(f64::INFINITY, f64::min);
    assert!(hole_min_x < 1.5 - 0.05);
}

#[test]
fn test_wide_line_buffer_follows_geodesic() {
    let engine = BufferEngine::default();
    for (path, distance) in [
        (vec![[0.0, 60.0], [20.0, 60.0]], 50_000.0),
        (vec![[0.0, 65.0], [30.0, 75.0]], 100_000.0),
    ] {
        let line = Geometry::line_string(path.clone());
        let result = engine.buffer(&line, distance, true).unwrap();
        assert!(matches!(result.shape, Shape::Polygon(_)), "seams left in {:?}", result.geometry_type());
        assert_vertices_on_offset(&result, &geodesic_path(&path, distance / 40.0), distance);
    }
}

#[test]
fn test_wide_box_buffer_follows_geodesic() {
    let engine = BufferEngine::default();
    let ring = vec![[0.0, 40.0], [20.0, 40.0], [20.0, 50.0], [0.0, 50.0], [0.0, 40.0]];
    let source = geodesic_path(&ring, 1_000.0);
    let box_geometry = Geometry::polygon(vec![ring]);

    for distance in [50_000.0, -50_000.0] {
        let result = engine.buffer(&box_geometry, distance, true).unwrap();
        assert!(
            matches!(&result.shape, Shape::Polygon(rings) if rings.len() == 1),
            "{} m buffer came back as {:?}",
            distance,
            result.geometry_type()
        );
        assert_vertices_on_offset(&result, &source, distance);
    }
}

#[test]
fn test_inward_buffer_past_accuracy_limit_is_refused() {
    let engine = BufferEngine::default();
    let square = Geometry::polygon(vec![vec![[0.0, 0.0], [30.0, 0.0], [30.0, 30.0], [0.0, 30.0], [0.0, 0.0]]]);
    let err = engine.try_buffer(&square, -700_000.0, true).unwrap_err();
    assert!(matches!(err, meridian_core::MeridianError::AccuracyLimit { distance, .. } if distance == -700_000.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn wide_line_buffer_stays_on_offset(
        x in -150.0f64..130.0,
        y in -55.0f64..55.0,
        width in 8.0f64..20.0,
        rise in -5.0f64..5.0,
        distance in 20_000.0f64..120_000.0,
    ) {
        let path = vec![[x, y], [x + width, y + rise]];
        let engine = BufferEngine::default();
        let result = engine.buffer(&Geometry::line_string(path.clone()), distance, true).unwrap();
        let source = geodesic_path(&path, distance / 40.0);
        for c in rings(&result).concat() {
            let offset = distance_to_path(c, &source);
            prop_assert!((offset - distance).abs() <= distance * 0.005 + 10.0, "{} vs {}", offset, distance);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn zero_distance_builds_nothing(geometry in geometry_strategy()) {
        let engine = BufferEngine::default();
        prop_assert!(engine.buffer(&geometry, 0.0, true).is_none());
    }

    #[test]
    fn point_buffer_stays_on_radius(
        x in -170.0f64..170.0,
        y in -70.0f64..70.0,
        radius in 1_000.0f64..200_000.0,
    ) {
        let engine = BufferEngine::default();
        let result = engine.buffer(&Geometry::point(x, y), radius, true).unwrap();
        let center = Point::new(x, y);
        for c in rings(&result).concat() {
            let d = Geodesic.distance(center, Point::new(c[0], c[1]));
            prop_assert!((d - radius).abs() <= radius * 0.005, "{} vs {}", d, radius);
        }
    }

    #[test]
    fn validate_keeps_valid_polygons(
        x in -170.0f64..170.0,
        y in -70.0f64..70.0,
        w in 0.01f64..5.0,
        h in 0.01f64..5.0,
    ) {
        let adapter = TopologyAdapter::default();
        let polygon = Geometry::polygon(vec![vec![[x, y], [x, y + h], [x + w, y + h], [x + w, y], [x, y]]]);
        let (repaired, imprecise) = adapter.validate_with_report(&polygon, true);
        prop_assert!(!imprecise);
        let before = rings(&polygon);
        let after = rings(&repaired);
        prop_assert_eq!(before.len(), after.len());

        let perimeter = |ring: &Vec<[f64; 2]>| {
            let coords: Vec<_> = ring.iter().map(|c| meridian_core::models::Coordinate::new(c[0], c[1])).collect();
            geodesic_perimeter(&coords)
        };
        let (p0, p1) = (perimeter(&before[0]), perimeter(&after[0]));
        prop_assert!((p0 - p1).abs() <= p0 * 1e-9);
    }
}
