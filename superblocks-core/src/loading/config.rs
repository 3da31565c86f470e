use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Set of street-type tags used by the type predicates
pub type StreetTypeSet = BTreeSet<String>;

fn type_set(types: &[&str]) -> StreetTypeSet {
    types.iter().map(|t| (*t).to_string()).collect()
}

/// Every tunable policy number of the pipeline.
///
/// Defaults follow the values the analysis was calibrated with for a dense
/// European city core. All distances are metres and all areas square metres,
/// regardless of the coordinate frame of the input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub place_name: String,

    // Capacity estimation
    pub default_lanes: f64,
    /// km/h
    pub default_maxspeed: f64,
    /// Metres per lane, used when a segment has no width tag
    pub default_width: f64,
    pub min_lanes: f64,
    pub lane_width: f64,
    pub capacity_scale_factor: f64,

    // Street classification
    pub boundary_capacity_quantile: f64,
    pub boundary_highway_types: StreetTypeSet,
    pub internal_highway_types: StreetTypeSet,
    pub major_road_capacity_quantile: f64,
    pub major_highway_types: StreetTypeSet,
    pub major_road_buffer_metres: f64,
    /// Subtract buffered major corridors from superblocks
    pub exclude_major_roads: bool,

    // Priority (heritage) zone
    pub heritage_zone_radius_m: f64,
    pub heritage_capacity_quantile: f64,
    pub heritage_priority_highway_types: StreetTypeSet,
    pub heritage_zone_buffer_m: f64,
    pub heritage_zone_min_area_m2: f64,

    // Geometry handling
    pub boundary_buffer_metres: f64,
    pub block_min_area_m2: f64,
    pub superblock_min_area_m2: f64,
    pub clean_tolerance: f64,

    // Access control
    pub oneway_capacity_quantile: f64,
    /// `None` places filters on every long enough internal street
    pub filter_capacity_quantile: Option<f64>,
    pub min_filter_length_m: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            place_name: "Budapest, Hungary".to_string(),
            default_lanes: 2.0,
            default_maxspeed: 50.0,
            default_width: 3.5,
            min_lanes: 1.0,
            lane_width: 3.5,
            capacity_scale_factor: 1.0,
            boundary_capacity_quantile: 0.65,
            boundary_highway_types: type_set(&[
                "motorway",
                "motorway_link",
                "trunk",
                "trunk_link",
                "primary",
                "primary_link",
                "secondary",
                "secondary_link",
            ]),
            internal_highway_types: type_set(&[
                "tertiary",
                "tertiary_link",
                "unclassified",
                "residential",
                "living_street",
                "service",
                "road",
                "pedestrian",
                "track",
            ]),
            major_road_capacity_quantile: 0.85,
            major_highway_types: type_set(&[
                "motorway",
                "motorway_link",
                "trunk",
                "trunk_link",
                "primary",
                "primary_link",
            ]),
            major_road_buffer_metres: 25.0,
            exclude_major_roads: true,
            heritage_zone_radius_m: 1500.0,
            heritage_capacity_quantile: 0.55,
            heritage_priority_highway_types: type_set(&[
                "residential",
                "living_street",
                "pedestrian",
                "service",
                "unclassified",
            ]),
            heritage_zone_buffer_m: 150.0,
            heritage_zone_min_area_m2: 25_000.0,
            boundary_buffer_metres: 5.0,
            block_min_area_m2: 75.0,
            superblock_min_area_m2: 5_000.0,
            clean_tolerance: 0.5,
            oneway_capacity_quantile: 0.4,
            filter_capacity_quantile: Some(0.6),
            min_filter_length_m: 50.0,
        }
    }
}

impl PipelineConfig {
    /// Check the configuration for values the pipeline cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending field
    pub fn validate(&self) -> Result<(), Error> {
        let quantiles = [
            ("boundary_capacity_quantile", Some(self.boundary_capacity_quantile)),
            ("major_road_capacity_quantile", Some(self.major_road_capacity_quantile)),
            ("heritage_capacity_quantile", Some(self.heritage_capacity_quantile)),
            ("oneway_capacity_quantile", Some(self.oneway_capacity_quantile)),
            ("filter_capacity_quantile", self.filter_capacity_quantile),
        ];
        for (name, value) in quantiles {
            if let Some(q) = value
                && !(q > 0.0 && q < 1.0)
            {
                return Err(Error::InvalidConfig(format!(
                    "{name} must lie strictly between 0 and 1, got {q}"
                )));
            }
        }

        let non_negative = [
            ("boundary_buffer_metres", self.boundary_buffer_metres),
            ("major_road_buffer_metres", self.major_road_buffer_metres),
            ("heritage_zone_buffer_m", self.heritage_zone_buffer_m),
            ("heritage_zone_radius_m", self.heritage_zone_radius_m),
            ("block_min_area_m2", self.block_min_area_m2),
            ("clean_tolerance", self.clean_tolerance),
            ("min_filter_length_m", self.min_filter_length_m),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.lane_width <= 0.0 || self.min_lanes <= 0.0 {
            return Err(Error::InvalidConfig(
                "lane_width and min_lanes must be positive".to_string(),
            ));
        }

        if self.superblock_min_area_m2 <= self.block_min_area_m2 {
            return Err(Error::InvalidConfig(format!(
                "superblock_min_area_m2 ({}) must exceed block_min_area_m2 ({})",
                self.superblock_min_area_m2, self.block_min_area_m2
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn superblock_floor_must_exceed_block_floor() {
        let config = PipelineConfig {
            superblock_min_area_m2: 50.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_out_of_range_quantile() {
        let config = PipelineConfig {
            filter_capacity_quantile: Some(1.5),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        for q in [0.0, 1.0, f64::NAN] {
            let config = PipelineConfig {
                oneway_capacity_quantile: q,
                ..PipelineConfig::default()
            };
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))), "accepted {q}");
        }

        let config = PipelineConfig {
            filter_capacity_quantile: None,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"boundary_capacity_quantile": 0.7}"#).unwrap();
        assert!((config.boundary_capacity_quantile - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.superblock_min_area_m2, 5_000.0);
    }
}
