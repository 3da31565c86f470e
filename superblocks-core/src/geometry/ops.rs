use geo::{
    Area, BoundingRect, Buffer, Distance, Euclidean, Length, LineString,
    MultiLineString, MultiPolygon, Point, Polygon, Simplify, Validation, unary_union,
};
use log::{debug, warn};

use super::projection::{Crs, MetricProjection, combined_bounds};

fn projection_for_lines(crs: Crs, lines: &[LineString<f64>]) -> MetricProjection {
    MetricProjection::estimate(
        crs,
        combined_bounds(lines.iter().filter_map(BoundingRect::bounding_rect)),
    )
}

fn projection_for_polygons(crs: Crs, polygons: &[Polygon<f64>]) -> MetricProjection {
    MetricProjection::estimate(
        crs,
        combined_bounds(polygons.iter().filter_map(BoundingRect::bounding_rect)),
    )
}

/// Buffer line work by `distance` metres and dissolve the result.
///
/// Lines are projected to a local metric frame, buffered, and the buffer
/// is projected back into `crs`.
pub fn buffer_lines_in_metres(
    lines: &[LineString<f64>],
    crs: Crs,
    distance: f64,
) -> MultiPolygon<f64> {
    if lines.is_empty() || distance <= 0.0 {
        return MultiPolygon::new(vec![]);
    }
    let projection = projection_for_lines(crs, lines);
    let projected = projection.project(&MultiLineString::new(lines.to_vec()));
    let buffered = projected.buffer(distance);
    projection.unproject(&unary_union(&buffered.0))
}

/// Buffer polygons by `distance` metres; a non-positive distance only dissolves
pub fn buffer_polygons_in_metres(
    polygons: &[Polygon<f64>],
    crs: Crs,
    distance: f64,
) -> MultiPolygon<f64> {
    if polygons.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    if distance <= 0.0 {
        return unary_union(polygons);
    }
    let projection = projection_for_polygons(crs, polygons);
    let projected = projection.project(&MultiPolygon::new(polygons.to_vec()));
    projection.unproject(&unary_union(&projected.buffer(distance).0))
}

/// Disc of `radius` metres around a point
pub fn buffer_point_in_metres(point: Point<f64>, crs: Crs, radius: f64) -> MultiPolygon<f64> {
    if radius <= 0.0 {
        return MultiPolygon::new(vec![]);
    }
    let projection = MetricProjection::estimate(crs, Some(point.bounding_rect()));
    let projected = projection.project(&point);
    projection.unproject(&projected.buffer(radius))
}

fn projection_for_polygon(polygon: &Polygon<f64>, crs: Crs) -> MetricProjection {
    MetricProjection::estimate(crs, polygon.bounding_rect())
}

/// Area of a polygon in square metres
pub fn metric_area(polygon: &Polygon<f64>, crs: Crs) -> f64 {
    projection_for_polygon(polygon, crs)
        .project(polygon)
        .unsigned_area()
}

/// Length of a line in metres
pub fn metric_length(line: &LineString<f64>, crs: Crs) -> f64 {
    let projection = MetricProjection::estimate(crs, line.bounding_rect());
    Euclidean.length(&projection.project(line))
}

/// Split multi-part geometries into their polygons
pub fn explode(multi: MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    multi
        .0
        .into_iter()
        .filter(|polygon| !polygon.exterior().0.is_empty())
        .collect()
}

/// Union all polygons and split the result into single polygons
pub fn dissolve(polygons: &[Polygon<f64>]) -> Vec<Polygon<f64>> {
    if polygons.is_empty() {
        return Vec::new();
    }
    explode(unary_union(polygons))
}

/// Repair, filter and simplify polygons.
///
/// Every polygon is re-noded with a zero-width overlay (its self-union),
/// multi-part results are split, parts that are still invalid are dropped,
/// parts smaller than `min_area_m2` are dropped, and the survivors are
/// simplified within `tolerance` metres. A simplified ring is only kept when it
/// stays valid and above the area floor, so faces never vanish or merge.
///
/// Each part is measured in its own projection, the one [`metric_area`]
/// picks, so the floor agrees with reported areas across UTM zones.
pub fn clean_polygons(
    polygons: Vec<Polygon<f64>>,
    crs: Crs,
    min_area_m2: f64,
    tolerance: f64,
) -> Vec<Polygon<f64>> {
    if polygons.is_empty() {
        return polygons;
    }

    let input_count = polygons.len();
    let mut invalid = 0usize;
    let mut too_small = 0usize;
    let mut cleaned = Vec::with_capacity(input_count);

    for polygon in &polygons {
        let projection = projection_for_polygon(polygon, crs);
        let repaired = unary_union(std::iter::once(&projection.project(polygon)));

        for part in repaired {
            if !part.is_valid() {
                invalid += 1;
                continue;
            }
            let part = projection.unproject(&part);
            let area = metric_area(&part, crs);
            if area < min_area_m2 || area <= 0.0 {
                too_small += 1;
                continue;
            }
            cleaned.push(simplify_within(part, crs, tolerance, min_area_m2));
        }
    }

    if invalid > 0 {
        warn!("Dropped {invalid} polygons that were still invalid after repair");
    }
    debug!(
        "Cleaned {input_count} polygons into {} (dropped {too_small} below {min_area_m2} m2)",
        cleaned.len()
    );
    cleaned
}

fn simplify_within(
    polygon: Polygon<f64>,
    crs: Crs,
    tolerance: f64,
    min_area_m2: f64,
) -> Polygon<f64> {
    if tolerance <= 0.0 {
        return polygon;
    }
    let projection = projection_for_polygon(&polygon, crs);
    let simplified = projection.unproject(&projection.project(&polygon).simplify(tolerance));
    let keeps_shape = simplified.exterior().0.len() >= 4
        && simplified.is_valid()
        && metric_area(&simplified, crs) >= min_area_m2;
    if keeps_shape { simplified } else { polygon }
}

/// Distance between two geometries in metres when they share a frame
pub(crate) fn metric_distance(
    projection: &MetricProjection,
    a: &Polygon<f64>,
    b: &Polygon<f64>,
) -> f64 {
    Euclidean.distance(&projection.project(a), &projection.project(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Contains, line_string, polygon};

    #[test]
    fn buffers_degrees_by_metres() {
        let lines = vec![line_string![(x: 19.04, y: 47.50), (x: 19.05, y: 47.50)]];
        let buffered = buffer_lines_in_metres(&lines, Crs::Wgs84, 10.0);
        assert_eq!(buffered.0.len(), 1);

        // ~750 m long, 20 m wide corridor plus round caps
        let area = metric_area(&buffered.0[0], Crs::Wgs84);
        assert!(area > 14_000.0 && area < 16_500.0, "got {area}");

        // A point 5 m north is inside, 15 m north is not (1e-5 deg lat ~ 1.1 m)
        assert!(buffered.contains(&Point::new(19.045, 47.50 + 4.5e-5)));
        assert!(!buffered.contains(&Point::new(19.045, 47.50 + 13.5e-5)));
    }

    #[test]
    fn zero_distance_buffer_of_lines_is_empty() {
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]];
        assert!(buffer_lines_in_metres(&lines, Crs::Metric, 0.0).0.is_empty());
    }

    #[test]
    fn clean_drops_small_polygons() {
        let big = polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)];
        let small = polygon![(x: 200.0, y: 0.0), (x: 205.0, y: 0.0), (x: 205.0, y: 5.0), (x: 200.0, y: 5.0)];
        let cleaned = clean_polygons(vec![big, small], Crs::Metric, 75.0, 0.5);
        assert_eq!(cleaned.len(), 1);
        assert_relative_eq!(cleaned[0].unsigned_area(), 10_000.0, epsilon = 1e-6);
    }

    #[test]
    fn clean_never_returns_polygons_below_the_floor() {
        let polygons = vec![
            polygon![(x: 19.0, y: 47.0), (x: 19.001, y: 47.0), (x: 19.001, y: 47.001), (x: 19.0, y: 47.001)],
            polygon![(x: 19.01, y: 47.0), (x: 19.0101, y: 47.0), (x: 19.0101, y: 47.0001), (x: 19.01, y: 47.0001)],
        ];
        let min_area = 5_000.0;
        let cleaned = clean_polygons(polygons, Crs::Wgs84, min_area, 0.5);
        assert_eq!(cleaned.len(), 1);
        for polygon in &cleaned {
            assert!(metric_area(polygon, Crs::Wgs84) >= min_area);
        }
    }

    #[test]
    fn area_floor_matches_metric_area_across_utm_zones() {
        // Combined bounds centre on zone 33, the small polygon lies in zone 34
        let large = polygon![(x: 12.0, y: 47.0), (x: 12.01, y: 47.0), (x: 12.01, y: 47.01), (x: 12.0, y: 47.01)];
        let small = polygon![(x: 23.9, y: 47.0), (x: 23.903, y: 47.0), (x: 23.903, y: 47.003), (x: 23.9, y: 47.003)];
        let small_area = metric_area(&small, Crs::Wgs84);
        let min_area = small_area * 1.004;

        let cleaned = clean_polygons(vec![large, small], Crs::Wgs84, min_area, 0.5);
        assert_eq!(cleaned.len(), 1);
        assert!(cleaned[0].exterior().0[0].x < 13.0);
        for polygon in &cleaned {
            assert!(metric_area(polygon, Crs::Wgs84) >= min_area);
        }
    }

    #[test]
    fn dissolve_merges_overlapping_polygons() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
        let b = polygon![(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)];
        let c = polygon![(x: 10.0, y: 10.0), (x: 11.0, y: 10.0), (x: 11.0, y: 11.0), (x: 10.0, y: 11.0)];
        let dissolved = dissolve(&[a, b, c]);
        assert_eq!(dissolved.len(), 2);
    }

    #[test]
    fn metric_length_of_a_degree_line() {
        let line = line_string![(x: 19.04, y: 47.50), (x: 19.04, y: 47.51)];
        let length = metric_length(&line, Crs::Wgs84);
        assert!((length - 1_112.0).abs() < 5.0, "got {length}");
    }
}
