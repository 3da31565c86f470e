use geo::{LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::{Value, json};

use crate::{
    Error,
    geometry::{Crs, metric_area},
    model::{Block, ModalFilter, Segment, Superblock},
    streets::{HeritagePriority, MajorRoad},
};

fn feature(geometry: Geometry, properties: Value) -> Result<Feature, Error> {
    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": properties,
    });
    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

fn line_geometry(line: &LineString<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::from(line))
}

fn polygon_geometry(polygon: &Polygon<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::from(polygon))
}

fn segment_properties(segment: &Segment) -> Value {
    json!({
        "id": segment.id,
        "name": segment.name,
        "highway": segment.highway,
        "lanes": segment.lanes,
        "maxspeed": segment.maxspeed,
        "width": segment.width,
        "capacity": segment.capacity,
        "capacity_per_lane": segment.capacity_per_lane,
        "oneway": segment.access.is_oneway(),
        "direction": segment.access.direction(),
        "access_control": segment.access.mode(),
    })
}

/// Segments with their capacity and access-control fields
pub fn segments_to_geojson(segments: &[Segment]) -> Result<FeatureCollection, Error> {
    segments
        .iter()
        .map(|segment| feature(line_geometry(&segment.geometry), segment_properties(segment)))
        .collect::<Result<Vec<_>, _>>()
        .map(collection)
}

pub fn blocks_to_geojson(blocks: &[Block]) -> Result<FeatureCollection, Error> {
    blocks
        .iter()
        .map(|block| {
            feature(
                polygon_geometry(&block.geometry),
                json!({
                    "block_id": block.id,
                    "superblock_id": block.superblock_id,
                }),
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map(collection)
}

/// Superblocks with their area in square metres
pub fn superblocks_to_geojson(
    superblocks: &[Superblock],
    crs: Crs,
) -> Result<FeatureCollection, Error> {
    superblocks
        .iter()
        .map(|superblock| {
            feature(
                polygon_geometry(&superblock.geometry),
                json!({
                    "superblock_id": superblock.id,
                    "area_m2": metric_area(&superblock.geometry, crs),
                }),
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map(collection)
}

pub fn modal_filters_to_geojson(filters: &[ModalFilter]) -> Result<FeatureCollection, Error> {
    filters
        .iter()
        .map(|filter| {
            feature(
                Geometry::new(GeoJsonValue::from(&filter.geometry)),
                json!({
                    "filter_type": ModalFilter::FILTER_TYPE,
                    "street_name": filter.street_name,
                    "superblock_id": filter.superblock_id,
                    "reason": filter.reason,
                }),
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map(collection)
}

pub fn major_roads_to_geojson(roads: &[MajorRoad]) -> Result<FeatureCollection, Error> {
    roads
        .iter()
        .map(|road| {
            let mut properties = segment_properties(&road.segment);
            properties["reason"] = json!(road.reason);
            feature(line_geometry(&road.segment.geometry), properties)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(collection)
}

pub fn heritage_priorities_to_geojson(
    priorities: &[HeritagePriority],
) -> Result<FeatureCollection, Error> {
    priorities
        .iter()
        .map(|priority| {
            let mut properties = segment_properties(&priority.segment);
            properties["distance_to_centre_m"] = json!(priority.distance_to_centre_m);
            feature(line_geometry(&priority.segment.geometry), properties)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(collection)
}

pub fn priority_zone_to_geojson(zone: &MultiPolygon<f64>) -> Result<FeatureCollection, Error> {
    if zone.0.is_empty() {
        return Ok(collection(Vec::new()));
    }
    let zone_feature = feature(
        Geometry::new(GeoJsonValue::from(zone)),
        json!({ "zone": "priority" }),
    )?;
    Ok(collection(vec![zone_feature]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessControl, FilterReason, StreetType};
    use geo::{Point, line_string, polygon};

    fn segment() -> Segment {
        Segment {
            id: 7,
            geometry: line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            name: None,
            highway: Some(StreetType::from("residential")),
            lanes: 1.0,
            maxspeed: 30.0,
            width: 3.5,
            capacity: 105.0,
            capacity_per_lane: 105.0,
            source_oneway: false,
            access: AccessControl::one_way(false),
        }
    }

    #[test]
    fn segment_features_carry_access_fields() {
        let collection = segments_to_geojson(&[segment()]).unwrap();
        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(feature.property("oneway"), Some(&json!(true)));
        assert_eq!(feature.property("direction"), Some(&json!("reverse")));
        assert_eq!(feature.property("access_control"), Some(&json!("oneway")));
        assert_eq!(feature.property("highway"), Some(&json!("residential")));
    }

    #[test]
    fn filter_features_use_fixed_type_and_reason() {
        let filter = ModalFilter {
            geometry: Point::new(5.0, 0.0),
            street_name: "Street 7".to_string(),
            superblock_id: 2,
            reason: FilterReason::ThroughRoutePrevention,
        };
        let collection = modal_filters_to_geojson(&[filter]).unwrap();
        let feature = &collection.features[0];
        assert_eq!(feature.property("filter_type"), Some(&json!("modal_filter")));
        assert_eq!(feature.property("reason"), Some(&json!("through_route_prevention")));
        assert_eq!(feature.property("superblock_id"), Some(&json!(2)));
    }

    #[test]
    fn superblock_features_report_metric_area() {
        let superblock = Superblock {
            id: 0,
            geometry: polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
        };
        let collection = superblocks_to_geojson(&[superblock], Crs::Metric).unwrap();
        assert_eq!(collection.features[0].property("area_m2"), Some(&json!(10_000.0)));
    }
}
