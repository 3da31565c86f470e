//! Street segments - raw input records and capacity-enriched segments

use std::collections::BTreeSet;

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

use super::AccessControl;
use crate::loading::StreetTypeSet;

pub type SegmentId = usize;

/// Heterogeneous tag value as found in map data
///
/// Numeric attributes arrive as numbers, free text (`"3;2"`, `"50 km/h"`),
/// booleans or lists of those when several ways were merged into one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<TagValue>),
}

/// Street type tag of a segment, single or multi-valued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreetType {
    Single(String),
    Multiple(BTreeSet<String>),
}

impl StreetType {
    /// True if any of the tags is in `candidates`
    pub fn matches_any(&self, candidates: &StreetTypeSet) -> bool {
        match self {
            StreetType::Single(tag) => candidates.contains(tag),
            StreetType::Multiple(tags) => tags.iter().any(|tag| candidates.contains(tag)),
        }
    }

    pub fn tags(&self) -> Vec<&str> {
        match self {
            StreetType::Single(tag) => vec![tag.as_str()],
            StreetType::Multiple(tags) => tags.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for StreetType {
    fn from(value: &str) -> Self {
        StreetType::Single(value.to_string())
    }
}

/// Street network node
#[derive(Debug, Clone)]
pub struct StreetNode {
    pub id: u64,
    pub geometry: Point<f64>,
}

/// Street segment as delivered by the network-acquisition step
#[derive(Debug, Clone)]
pub struct RawSegment {
    pub geometry: LineString<f64>,
    pub name: Option<String>,
    pub highway: Option<StreetType>,
    pub lanes: Option<TagValue>,
    pub maxspeed: Option<TagValue>,
    pub width: Option<TagValue>,
    /// One-way indicator from the source data, if any
    pub oneway: Option<TagValue>,
}

impl RawSegment {
    pub fn new(geometry: LineString<f64>) -> Self {
        Self {
            geometry,
            name: None,
            highway: None,
            lanes: None,
            maxspeed: None,
            width: None,
            oneway: None,
        }
    }

    #[must_use]
    pub fn with_highway(mut self, highway: impl Into<StreetType>) -> Self {
        self.highway = Some(highway.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Street segment with numeric attributes and capacity populated
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub geometry: LineString<f64>,
    pub name: Option<String>,
    pub highway: Option<StreetType>,
    pub lanes: f64,
    /// km/h
    pub maxspeed: f64,
    /// metres
    pub width: f64,
    pub capacity: f64,
    pub capacity_per_lane: f64,
    /// The source data already marks this segment as one-way
    pub source_oneway: bool,
    pub access: AccessControl,
}

impl Segment {
    /// Street type predicate; a segment without a type tag never matches
    pub fn matches_type(&self, candidates: &StreetTypeSet) -> bool {
        self.highway
            .as_ref()
            .is_some_and(|highway| highway.matches_any(candidates))
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Street {}", self.id))
    }
}
