//! Synthetic capacity estimation from lane count and speed limit

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::{
    PipelineConfig,
    algo::quantile::quantile,
    model::{AccessControl, RawSegment, Segment, TagValue},
};

static NUMERIC: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").ok());

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Best-effort conversion of a heterogeneous tag to a number
///
/// Text yields the mean of every number it contains, so `"3;2"` is 2.5 and
/// `"50 km/h"` is 50. Lists yield the mean of their numeric members.
pub fn extract_numeric(tag: &TagValue) -> Option<f64> {
    match tag {
        TagValue::Number(value) if value.is_finite() => Some(*value),
        TagValue::Number(_) | TagValue::Bool(_) => None,
        TagValue::Text(text) => {
            let numbers: Vec<f64> = NUMERIC
                .as_ref()?
                .find_iter(text)
                .filter_map(|m| m.as_str().parse().ok())
                .collect();
            mean(&numbers)
        }
        TagValue::List(items) => {
            let numbers: Vec<f64> = items.iter().filter_map(extract_numeric).collect();
            mean(&numbers)
        }
    }
}

/// Whether a source one-way tag marks the segment as one-way
pub fn is_affirmative_oneway(tag: &TagValue) -> bool {
    match tag {
        TagValue::Bool(value) => *value,
        TagValue::Number(value) => *value != 0.0,
        TagValue::Text(text) => !matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "" | "no" | "false" | "0"
        ),
        TagValue::List(items) => items.iter().any(is_affirmative_oneway),
    }
}

/// Populate numeric attributes and capacity for every segment
///
/// Ids are assigned in input order.
pub fn estimate_capacity(segments: &[RawSegment], config: &PipelineConfig) -> Vec<Segment> {
    let enriched: Vec<Segment> = segments
        .iter()
        .enumerate()
        .map(|(id, raw)| enrich_segment(id, raw, config))
        .collect();

    if !enriched.is_empty() {
        let capacities = || enriched.iter().map(|s| s.capacity);
        debug!(
            "Capacity statistics min={:.1} median={:.1} max={:.1}",
            capacities().fold(f64::INFINITY, f64::min),
            quantile(capacities(), 0.5).unwrap_or_default(),
            capacities().fold(f64::NEG_INFINITY, f64::max),
        );
    }

    enriched
}

fn enrich_segment(id: usize, raw: &RawSegment, config: &PipelineConfig) -> Segment {
    let lanes = raw
        .lanes
        .as_ref()
        .and_then(extract_numeric)
        .unwrap_or(config.default_lanes)
        .max(config.min_lanes);
    let maxspeed = raw
        .maxspeed
        .as_ref()
        .and_then(extract_numeric)
        .unwrap_or(config.default_maxspeed);
    let width = raw
        .width
        .as_ref()
        .and_then(extract_numeric)
        .unwrap_or(lanes * config.default_width);

    let capacity = (lanes * config.lane_width * maxspeed * config.capacity_scale_factor).max(0.0);

    Segment {
        id,
        geometry: raw.geometry.clone(),
        name: raw.name.clone(),
        highway: raw.highway.clone(),
        lanes,
        maxspeed,
        width,
        capacity,
        capacity_per_lane: capacity / lanes,
        source_oneway: raw.oneway.as_ref().is_some_and(is_affirmative_oneway),
        access: AccessControl::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::line_string;

    fn text(value: &str) -> TagValue {
        TagValue::Text(value.to_string())
    }

    #[test]
    fn parses_heterogeneous_tags() {
        assert_eq!(extract_numeric(&text("3;2")), Some(2.5));
        assert_eq!(extract_numeric(&text("50 km/h")), Some(50.0));
        assert_eq!(extract_numeric(&text("none")), None);
        assert_eq!(extract_numeric(&TagValue::Number(7.0)), Some(7.0));
        assert_eq!(
            extract_numeric(&TagValue::List(vec![text("2"), TagValue::Number(4.0)])),
            Some(3.0)
        );
        assert_eq!(extract_numeric(&TagValue::Bool(true)), None);
    }

    #[test]
    fn recognises_oneway_indicators() {
        assert!(is_affirmative_oneway(&text("yes")));
        assert!(is_affirmative_oneway(&text("-1")));
        assert!(is_affirmative_oneway(&TagValue::Bool(true)));
        assert!(!is_affirmative_oneway(&text("no")));
        assert!(!is_affirmative_oneway(&text("False")));
        assert!(!is_affirmative_oneway(&TagValue::Number(0.0)));
    }

    #[test]
    fn capacity_is_always_positive_and_defined() {
        let config = PipelineConfig::default();
        let mut first = RawSegment::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        first.lanes = Some(text("2"));
        first.maxspeed = Some(text("50 km/h"));
        first.width = Some(text("7.0"));
        let mut second = RawSegment::new(line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]);
        second.lanes = Some(text("3;2"));
        second.maxspeed = Some(text("60"));

        let enriched = estimate_capacity(&[first, second], &config);
        assert_eq!(enriched.len(), 2);
        assert!(enriched.iter().all(|s| s.capacity > 0.0));

        assert_abs_diff_eq!(enriched[0].capacity, 2.0 * 3.5 * 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(enriched[0].width, 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(enriched[1].lanes, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(enriched[1].width, 2.5 * 3.5, epsilon = 1e-9);
        assert_abs_diff_eq!(enriched[1].capacity_per_lane, 3.5 * 60.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_tags_use_defaults_and_lane_floor() {
        let config = PipelineConfig::default();
        let mut raw = RawSegment::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        raw.lanes = Some(TagValue::Number(0.0));

        let enriched = estimate_capacity(&[raw], &config);
        assert_abs_diff_eq!(enriched[0].lanes, config.min_lanes, epsilon = 1e-9);
        assert_abs_diff_eq!(enriched[0].maxspeed, config.default_maxspeed, epsilon = 1e-9);
        assert!(!enriched[0].source_oneway);
    }
}
