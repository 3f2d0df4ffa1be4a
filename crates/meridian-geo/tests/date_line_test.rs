//! Date-line splitting and merging across geometry types.

use meridian_core::models::{Extent, Geometry, Shape};
use meridian_geo::antimeridian::{crosses_date_line, merge_line_geometry, split_on_date_line};
use meridian_geo::extent::{crosses_antimeridian, normalize_anti_left, normalize_anti_right};
use proptest::prelude::*;

fn lines(geometry: &Geometry) -> Vec<Vec<[f64; 2]>> {
    match &geometry.shape {
        Shape::LineString(coords) => vec![coords.iter().map(|c| [c.x, c.y]).collect()],
        Shape::MultiLineString(lines) => {
            lines.iter().map(|l| l.iter().map(|c| [c.x, c.y]).collect()).collect()
        }
        other => panic!("expected lines, got {:?}", other),
    }
}

#[test]
fn test_split_line_parts_are_continuous() {
    let line = Geometry::line_string(vec![[170.0, 10.0], [-170.0, 12.0], [-160.0, 14.0]]);
    assert!(crosses_date_line(&line));

    let split = split_on_date_line(&line);
    assert!(split.normalized);
    assert!(!crosses_date_line(&split));
    let parts = lines(&split);
    assert_eq!(parts.len(), 2);
    for part in &parts {
        assert!(part.windows(2).all(|w| (w[1][0] - w[0][0]).abs() <= 180.0));
    }
    // Each part carries a copy of the vertex across the line.
    assert_eq!(parts[0].last().unwrap(), &[190.0, 12.0]);
    assert_eq!(parts[1].first().unwrap(), &[-190.0, 10.0]);
}

#[test]
fn test_split_multi_line_keeps_each_member() {
    let lines_in = Geometry::multi_line_string(vec![
        vec![[175.0, 0.0], [-175.0, 0.0]],
        vec![[10.0, 0.0], [20.0, 0.0]],
    ]);
    let split = split_on_date_line(&lines_in);
    assert_eq!(lines(&split).len(), 3);
}

#[test]
fn test_split_polygon_across_date_line() {
    let polygon = Geometry::polygon(vec![vec![
        [175.0, -5.0],
        [-175.0, -5.0],
        [-175.0, 5.0],
        [175.0, 5.0],
        [175.0, -5.0],
    ]]);
    assert!(crosses_date_line(&polygon));
    let split = split_on_date_line(&polygon);
    let Shape::MultiPolygon(parts) = &split.shape else {
        panic!("expected two pieces, got {:?}", split.shape);
    };
    assert_eq!(parts.len(), 2);
    let extent = split.extent();
    assert!(extent.min_x >= -180.0 - 1e-9 && extent.max_x <= 180.0 + 1e-9);
}

#[test]
fn test_extent_normalization_around_date_line() {
    let extent = Extent::new(170.0, -10.0, 190.0, 10.0);
    assert!(crosses_antimeridian(&extent));
    let left = normalize_anti_left(&extent);
    let right = normalize_anti_right(&extent);
    assert_eq!((left.min_x, left.max_x), (170.0, 190.0));
    assert_eq!((right.min_x, right.max_x), (-190.0, -170.0));
}

proptest! {
    #[test]
    fn split_then_merge_restores_line(
        start in 100.0f64..179.0,
        steps in proptest::collection::vec((1.0f64..40.0, -5.0f64..5.0), 1..8),
        lat in -60.0f64..60.0,
    ) {
        // Eastward walk written with wrapped longitudes.
        let mut x = start;
        let mut y = lat;
        let mut coords = vec![[x, y]];
        for (dx, dy) in steps {
            x += dx;
            y = (y + dy).clamp(-80.0, 80.0);
            let wrapped = if x > 180.0 { x - 360.0 } else { x };
            coords.push([wrapped, y]);
        }
        let line = Geometry::line_string(coords.clone());
        let merged = merge_line_geometry(&split_on_date_line(&line));
        let parts = lines(&merged);
        prop_assert_eq!(parts.len(), 1);
        prop_assert_eq!(parts[0].len(), coords.len());
        for (a, b) in parts[0].iter().zip(&coords) {
            prop_assert!((a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn crossing_extents_pass_180_once_placed(min_x in -540.0f64..540.0, width in 0.0f64..100.0) {
        let extent = Extent::new(min_x, 0.0, min_x + width, 1.0);
        let placed = normalize_anti_left(&extent);
        prop_assert!((placed.width() - width).abs() < 1e-9);
        prop_assert_eq!(crosses_antimeridian(&extent), placed.max_x > 180.0);
    }
}
