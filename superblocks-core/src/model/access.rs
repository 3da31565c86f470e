//! Access-control fields and per-superblock results

use geo::Point;
use serde::{Deserialize, Serialize};

use super::SuperblockId;

/// Allowed travel direction relative to the segment's digitisation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Open,
    Oneway,
}

/// Access policy of a segment
///
/// A one-way segment always carries a single travel direction, so
/// `direction() == Direction::Both` implies `!is_oneway()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessControl {
    #[default]
    Open,
    /// Travel allowed only along (`true`) or against (`false`) the geometry
    Oneway { forward: bool },
}

impl AccessControl {
    pub fn one_way(forward: bool) -> Self {
        AccessControl::Oneway { forward }
    }

    pub fn is_oneway(self) -> bool {
        matches!(self, AccessControl::Oneway { .. })
    }

    pub fn direction(self) -> Direction {
        match self {
            AccessControl::Open => Direction::Both,
            AccessControl::Oneway { forward: true } => Direction::Forward,
            AccessControl::Oneway { forward: false } => Direction::Reverse,
        }
    }

    pub fn mode(self) -> AccessMode {
        match self {
            AccessControl::Open => AccessMode::Open,
            AccessControl::Oneway { .. } => AccessMode::Oneway,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    ThroughRoutePrevention,
}

/// Physical barrier against motor through-traffic
#[derive(Debug, Clone, PartialEq)]
pub struct ModalFilter {
    pub geometry: Point<f64>,
    pub street_name: String,
    pub superblock_id: SuperblockId,
    pub reason: FilterReason,
}

impl ModalFilter {
    pub const FILTER_TYPE: &'static str = "modal_filter";
}

/// Aggregate one-way/two-way counts of a superblock's internal streets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermeabilityRecord {
    pub superblock_id: SuperblockId,
    pub total_internal_streets: usize,
    pub oneway_streets: usize,
    pub twoway_streets: usize,
    /// Share of internal streets left two-way, lower means calmer
    pub permeability_score: f64,
    pub accessibility_score: f64,
}
