//! GeoJSON readers for street segments, nodes and priority-zone polygons

use std::path::Path;

use geo::{Geometry as GeoGeometry, LineString, Point, Polygon};
use geojson::{Feature, GeoJson};
use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::{
    Error,
    model::{RawSegment, StreetNode, StreetType, TagValue},
};

fn parse_features(input: &str) -> Result<Vec<Feature>, Error> {
    let geojson = input
        .parse::<GeoJson>()
        .map_err(|e| Error::GeoJsonError(e.to_string()))?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(Error::InvalidData(
            "expected a Feature or FeatureCollection, got a bare geometry".to_string(),
        )),
    }
}

fn feature_geometry(feature: &Feature) -> Option<GeoGeometry<f64>> {
    let geometry = feature.geometry.clone()?;
    GeoGeometry::<f64>::try_from(geometry).ok()
}

/// Property value, `None` when absent, null or of an unexpected shape
fn property<T: DeserializeOwned>(feature: &Feature, key: &str) -> Option<T> {
    feature
        .property(key)
        .filter(|value| !value.is_null())
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn segment_from(feature: &Feature, geometry: LineString<f64>) -> RawSegment {
    RawSegment {
        geometry,
        name: property::<String>(feature, "name"),
        highway: property::<StreetType>(feature, "highway"),
        lanes: property::<TagValue>(feature, "lanes"),
        maxspeed: property::<TagValue>(feature, "maxspeed"),
        width: property::<TagValue>(feature, "width"),
        oneway: property::<TagValue>(feature, "oneway"),
    }
}

/// Street segments from a GeoJSON document.
///
/// Every LineString feature becomes one segment and every part of a
/// MultiLineString becomes its own segment with the same properties. Other
/// geometry types are skipped with a warning.
pub fn parse_segments(input: &str) -> Result<Vec<RawSegment>, Error> {
    let features = parse_features(input)?;
    let mut segments = Vec::with_capacity(features.len());
    let mut skipped = 0usize;

    for feature in &features {
        match feature_geometry(feature) {
            Some(GeoGeometry::LineString(line)) => segments.push(segment_from(feature, line)),
            Some(GeoGeometry::MultiLineString(lines)) => {
                segments.extend(lines.into_iter().map(|line| segment_from(feature, line)));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {skipped} features without line geometry");
    }
    debug!(
        "Read {} segments from {} features",
        segments.len(),
        features.len()
    );
    Ok(segments)
}

/// Street nodes from Point features, with ids from an `osmid` or `id` property
pub fn parse_nodes(input: &str) -> Result<Vec<StreetNode>, Error> {
    let features = parse_features(input)?;
    let nodes = features
        .iter()
        .enumerate()
        .filter_map(|(idx, feature)| match feature_geometry(feature) {
            Some(GeoGeometry::Point(point)) => Some(StreetNode {
                id: property::<u64>(feature, "osmid")
                    .or_else(|| property::<u64>(feature, "id"))
                    .unwrap_or(idx as u64),
                geometry: point,
            }),
            _ => None,
        })
        .collect();
    Ok(nodes)
}

/// Polygons of every Polygon and MultiPolygon feature
pub fn parse_polygons(input: &str) -> Result<Vec<Polygon<f64>>, Error> {
    let features = parse_features(input)?;
    let mut polygons = Vec::new();
    for feature in &features {
        match feature_geometry(feature) {
            Some(GeoGeometry::Polygon(polygon)) => polygons.push(polygon),
            Some(GeoGeometry::MultiPolygon(multi)) => polygons.extend(multi),
            _ => warn!("Skipping a non-polygon priority zone feature"),
        }
    }
    Ok(polygons)
}

pub fn read_segments(path: &Path) -> Result<Vec<RawSegment>, Error> {
    parse_segments(&std::fs::read_to_string(path)?)
}

pub fn read_nodes(path: &Path) -> Result<Vec<StreetNode>, Error> {
    parse_nodes(&std::fs::read_to_string(path)?)
}

pub fn read_polygons(path: &Path) -> Result<Vec<Polygon<f64>>, Error> {
    parse_polygons(&std::fs::read_to_string(path)?)
}

/// Single point from a `lon,lat` (or `x,y`) pair
pub fn parse_point(input: &str) -> Result<Point<f64>, Error> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let [x, y] = parts.as_slice() else {
        return Err(Error::InvalidData(format!(
            "expected two comma-separated coordinates, got '{input}'"
        )));
    };
    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|e| Error::InvalidData(format!("invalid coordinate '{value}': {e}")))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[19.04, 47.50], [19.05, 47.50]]},
                "properties": {"highway": "primary", "name": "Andrassy ut", "lanes": "3;2", "maxspeed": 50, "oneway": "yes"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "MultiLineString", "coordinates": [
                    [[19.04, 47.51], [19.05, 47.51]],
                    [[19.05, 47.51], [19.05, 47.52]]
                ]},
                "properties": {"highway": ["residential", "living_street"], "width": null}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [19.04, 47.50]},
                "properties": {}
            }
        ]
    }"#;

    #[test]
    fn reads_lines_and_splits_multilines() {
        let segments = parse_segments(NETWORK).unwrap();
        assert_eq!(segments.len(), 3);

        let first = &segments[0];
        assert_eq!(first.name.as_deref(), Some("Andrassy ut"));
        assert_eq!(first.highway, Some(StreetType::from("primary")));
        assert_eq!(first.lanes, Some(TagValue::Text("3;2".to_string())));
        assert_eq!(first.maxspeed, Some(TagValue::Number(50.0)));
        assert_eq!(first.oneway, Some(TagValue::Text("yes".to_string())));

        assert_eq!(segments[1].highway, segments[2].highway);
        assert!(matches!(segments[1].highway, Some(StreetType::Multiple(_))));
        assert!(segments[1].width.is_none());
    }

    #[test]
    fn reads_point_features_as_nodes() {
        let nodes = parse_nodes(NETWORK).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, 2);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse_segments("{not json"), Err(Error::GeoJsonError(_))));
    }

    #[test]
    fn parses_centre_points() {
        assert_eq!(parse_point("19.04, 47.5").unwrap(), Point::new(19.04, 47.5));
        assert!(parse_point("19.04").is_err());
    }
}
