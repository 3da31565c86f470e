//! Major-corridor and priority-zone street layers
//!
//! Both layers are derived from the enriched network before any polygon is
//! built. Major corridors feed the superblock builder as an exclusion layer;
//! priority streets are reported only.

use geo::{
    BoundingRect, Centroid, Distance, Euclidean, Intersects, MultiPolygon, Point, Polygon,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    PipelineConfig,
    algo::quantile::quantile,
    geometry::{
        Crs, MetricProjection, buffer_point_in_metres, buffer_polygons_in_metres,
        combined_bounds, metric_area,
    },
    model::Segment,
};

/// Which predicate made a segment a major corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorRoadReason {
    HighwayType,
    Capacity,
    HighwayTypeAndCapacity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MajorRoad {
    pub segment: Segment,
    pub reason: MajorRoadReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeritagePriority {
    pub segment: Segment,
    /// Metric distance from the segment to the zone centroid
    pub distance_to_centre_m: f64,
}

/// Segments that are major corridors by street type or by capacity.
pub fn detect_major_roads(segments: &[Segment], config: &PipelineConfig) -> Vec<MajorRoad> {
    let Some(threshold) = quantile(
        segments.iter().map(|s| s.capacity),
        config.major_road_capacity_quantile,
    ) else {
        return Vec::new();
    };

    let major: Vec<MajorRoad> = segments
        .iter()
        .filter_map(|segment| {
            let by_type = segment.matches_type(&config.major_highway_types);
            let by_capacity = segment.capacity >= threshold;
            let reason = match (by_type, by_capacity) {
                (true, true) => MajorRoadReason::HighwayTypeAndCapacity,
                (true, false) => MajorRoadReason::HighwayType,
                (false, true) => MajorRoadReason::Capacity,
                (false, false) => return None,
            };
            Some(MajorRoad {
                segment: segment.clone(),
                reason,
            })
        })
        .collect();

    info!(
        "Detected {} major corridor segments (capacity threshold {threshold:.1})",
        major.len()
    );
    major
}

/// Low-capacity or calm-typed segments that touch the priority zone
///
/// Returns an empty set when the zone is empty.
pub fn identify_heritage_priorities(
    segments: &[Segment],
    zone: &MultiPolygon<f64>,
    crs: Crs,
    config: &PipelineConfig,
) -> Vec<HeritagePriority> {
    if zone.0.is_empty() || segments.is_empty() {
        return Vec::new();
    }
    let Some(centroid) = zone.centroid() else {
        return Vec::new();
    };
    let Some(threshold) = quantile(
        segments.iter().map(|s| s.capacity),
        config.heritage_capacity_quantile,
    ) else {
        return Vec::new();
    };

    let projection = MetricProjection::estimate(
        crs,
        combined_bounds(
            segments
                .iter()
                .filter_map(|s| s.geometry.bounding_rect())
                .chain(zone.bounding_rect()),
        ),
    );
    let metric_centroid = projection.project(&centroid);

    let priorities: Vec<HeritagePriority> = segments
        .iter()
        .filter(|segment| {
            (segment.capacity <= threshold
                || segment.matches_type(&config.heritage_priority_highway_types))
                && segment.geometry.intersects(zone)
        })
        .map(|segment| HeritagePriority {
            distance_to_centre_m: Euclidean
                .distance(&projection.project(&segment.geometry), &metric_centroid),
            segment: segment.clone(),
        })
        .collect();

    info!("Identified {} priority-zone street segments", priorities.len());
    priorities
}

/// Build the priority zone from candidate polygons.
///
/// Candidates are dissolved and buffered by `heritage_zone_buffer_m`, parts
/// below `heritage_zone_min_area_m2` are dropped, and when nothing survives a
/// disc of `heritage_zone_radius_m` around `centre` is used instead.
pub fn prepare_priority_zone(
    candidates: &[Polygon<f64>],
    centre: Option<Point<f64>>,
    crs: Crs,
    config: &PipelineConfig,
) -> MultiPolygon<f64> {
    let buffered = buffer_polygons_in_metres(candidates, crs, config.heritage_zone_buffer_m);
    let kept: Vec<Polygon<f64>> = buffered
        .into_iter()
        .filter(|polygon| metric_area(polygon, crs) >= config.heritage_zone_min_area_m2)
        .collect();

    if !kept.is_empty() {
        debug!(
            "Priority zone built from {} candidate polygons ({} parts kept)",
            candidates.len(),
            kept.len()
        );
        return MultiPolygon::new(kept);
    }

    match centre {
        Some(centre) if config.heritage_zone_radius_m > 0.0 => {
            info!(
                "Using a {} m circular priority zone around the network centre",
                config.heritage_zone_radius_m
            );
            buffer_point_in_metres(centre, crs, config.heritage_zone_radius_m)
        }
        _ => {
            warn!("No priority zone could be derived");
            MultiPolygon::new(vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessControl, StreetType};
    use geo::{LineString, line_string, polygon};

    fn segment(id: usize, geometry: LineString<f64>, highway: &str, capacity: f64) -> Segment {
        Segment {
            id,
            geometry,
            name: None,
            highway: Some(StreetType::from(highway)),
            lanes: 2.0,
            maxspeed: 50.0,
            width: 7.0,
            capacity,
            capacity_per_lane: capacity / 2.0,
            source_oneway: false,
            access: AccessControl::Open,
        }
    }

    #[test]
    fn major_roads_record_their_reason() {
        let config = PipelineConfig {
            major_road_capacity_quantile: 0.5,
            ..PipelineConfig::default()
        };
        let segments = vec![
            segment(0, line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)], "primary", 1000.0),
            segment(1, line_string![(x: 0.0, y: 1.0), (x: 1.0, y: 1.0)], "primary", 10.0),
            segment(2, line_string![(x: 0.0, y: 2.0), (x: 1.0, y: 2.0)], "residential", 900.0),
            segment(3, line_string![(x: 0.0, y: 3.0), (x: 1.0, y: 3.0)], "residential", 20.0),
        ];
        let major = detect_major_roads(&segments, &config);
        let reasons: Vec<(usize, MajorRoadReason)> =
            major.iter().map(|m| (m.segment.id, m.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                (0, MajorRoadReason::HighwayTypeAndCapacity),
                (1, MajorRoadReason::HighwayType),
                (2, MajorRoadReason::Capacity),
            ]
        );
    }

    #[test]
    fn heritage_priorities_lie_in_the_zone() {
        let config = PipelineConfig::default();
        let zone = MultiPolygon::new(vec![
            polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
        ]);
        let segments = vec![
            segment(0, line_string![(x: 10.0, y: 50.0), (x: 40.0, y: 50.0)], "residential", 900.0),
            segment(1, line_string![(x: 200.0, y: 0.0), (x: 300.0, y: 0.0)], "residential", 10.0),
            segment(2, line_string![(x: 50.0, y: 10.0), (x: 50.0, y: 40.0)], "primary", 1000.0),
        ];
        let priorities = identify_heritage_priorities(&segments, &zone, Crs::Metric, &config);
        assert_eq!(priorities.len(), 1);
        assert_eq!(priorities[0].segment.id, 0);
        assert!((priorities[0].distance_to_centre_m - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_zone_gives_no_priorities() {
        let segments = vec![segment(
            0,
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            "residential",
            10.0,
        )];
        let empty = MultiPolygon::new(vec![]);
        let priorities =
            identify_heritage_priorities(&segments, &empty, Crs::Metric, &PipelineConfig::default());
        assert!(priorities.is_empty());
    }

    #[test]
    fn small_candidates_fall_back_to_a_circle() {
        let config = PipelineConfig {
            heritage_zone_buffer_m: 0.0,
            heritage_zone_radius_m: 100.0,
            ..PipelineConfig::default()
        };
        let tiny = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let zone = prepare_priority_zone(&[tiny], Some(Point::new(500.0, 500.0)), Crs::Metric, &config);
        assert_eq!(zone.0.len(), 1);
        let area = metric_area(&zone.0[0], Crs::Metric);
        let expected = std::f64::consts::PI * 100.0 * 100.0;
        assert!(area > 0.85 * expected && area <= expected * 1.001, "got {area}");
    }

    #[test]
    fn large_candidates_are_kept() {
        let config = PipelineConfig {
            heritage_zone_buffer_m: 0.0,
            ..PipelineConfig::default()
        };
        let large = polygon![(x: 0.0, y: 0.0), (x: 500.0, y: 0.0), (x: 500.0, y: 500.0), (x: 0.0, y: 500.0)];
        let zone = prepare_priority_zone(&[large], None, Crs::Metric, &config);
        assert_eq!(zone.0.len(), 1);
        assert!((metric_area(&zone.0[0], Crs::Metric) - 250_000.0).abs() < 1e-6);
    }

    #[test]
    fn no_candidates_and_no_centre_is_empty() {
        let zone = prepare_priority_zone(&[], None, Crs::Metric, &PipelineConfig::default());
        assert!(zone.0.is_empty());
    }
}
