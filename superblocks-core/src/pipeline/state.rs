use geo::{BoundingRect, MultiPolygon, Point, Polygon};

use crate::{
    Error,
    geometry::{Crs, combined_bounds},
    metrics::NetworkMetrics,
    model::{
        Block, ModalFilter, PermeabilityRecord, RawSegment, Segment, StreetNode, Superblock,
    },
    streets::{Classification, HeritagePriority, MajorRoad},
};

/// Snapshot of one pipeline run after some prefix of the stages
///
/// Inputs are set on construction; every derived layer stays `None` until
/// the stage producing it has run.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub crs: Crs,
    pub raw_segments: Vec<RawSegment>,
    pub nodes: Vec<StreetNode>,
    pub fallback_centre: Option<Point<f64>>,
    /// Polygons the priority zone is derived from, if any
    pub priority_candidates: Vec<Polygon<f64>>,

    pub segments: Option<Vec<Segment>>,
    pub classification: Option<Classification>,
    pub major_roads: Option<Vec<MajorRoad>>,
    pub priority_zone: Option<MultiPolygon<f64>>,
    pub heritage_priorities: Option<Vec<HeritagePriority>>,
    pub blocks: Option<Vec<Block>>,
    pub superblocks: Option<Vec<Superblock>>,
    pub directed_streets: Option<Vec<Segment>>,
    pub modal_filters: Option<Vec<ModalFilter>>,
    pub permeability: Option<Vec<PermeabilityRecord>>,
    pub metrics: Option<NetworkMetrics>,
}

impl PipelineState {
    pub fn new(crs: Crs, raw_segments: Vec<RawSegment>) -> Self {
        Self {
            crs,
            raw_segments,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_nodes(mut self, nodes: Vec<StreetNode>) -> Self {
        self.nodes = nodes;
        self
    }

    #[must_use]
    pub fn with_fallback_centre(mut self, centre: Point<f64>) -> Self {
        self.fallback_centre = Some(centre);
        self
    }

    #[must_use]
    pub fn with_priority_candidates(mut self, candidates: Vec<Polygon<f64>>) -> Self {
        self.priority_candidates = candidates;
        self
    }

    /// Network centre: mean node position, else the centre of the segment
    /// bounds, else the fallback centre
    #[allow(clippy::cast_precision_loss)]
    pub fn centre(&self) -> Option<Point<f64>> {
        if !self.nodes.is_empty() {
            let count = self.nodes.len() as f64;
            let (x, y) = self
                .nodes
                .iter()
                .fold((0.0, 0.0), |(x, y), node| (x + node.geometry.x(), y + node.geometry.y()));
            return Some(Point::new(x / count, y / count));
        }

        combined_bounds(
            self.raw_segments
                .iter()
                .filter_map(|segment| segment.geometry.bounding_rect()),
        )
        .map(|bounds| Point::from(bounds.center()))
        .or(self.fallback_centre)
    }

    pub(crate) fn require_segments(&self) -> Result<&[Segment], Error> {
        self.segments.as_deref().ok_or_else(|| Error::missing("enrich"))
    }

    pub(crate) fn require_classification(&self) -> Result<&Classification, Error> {
        self.classification
            .as_ref()
            .ok_or_else(|| Error::missing("classify"))
    }

    pub(crate) fn require_blocks(&self) -> Result<&[Block], Error> {
        self.blocks.as_deref().ok_or_else(|| Error::missing("build_blocks"))
    }

    pub(crate) fn require_superblocks(&self) -> Result<&[Superblock], Error> {
        self.superblocks
            .as_deref()
            .ok_or_else(|| Error::missing("build_superblocks"))
    }
}
