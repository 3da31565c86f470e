use geo::{BoundingRect, Contains, Intersects, Rect};
use rstar::{
    AABB, RTree,
    primitives::{GeomWithData, Rectangle},
};

use crate::model::{Segment, Superblock};

type IndexedSegment = GeomWithData<Rectangle<[f64; 2]>, usize>;

fn corners(rect: Rect<f64>) -> ([f64; 2], [f64; 2]) {
    ([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Envelope index over internal segments for per-superblock selection
pub(crate) struct SegmentIndex<'a> {
    segments: &'a [Segment],
    tree: RTree<IndexedSegment>,
}

impl<'a> SegmentIndex<'a> {
    pub(crate) fn new(segments: &'a [Segment]) -> Self {
        let tree = RTree::bulk_load(
            segments
                .iter()
                .enumerate()
                .filter_map(|(idx, segment)| {
                    let (min, max) = corners(segment.geometry.bounding_rect()?);
                    Some(GeomWithData::new(Rectangle::from_corners(min, max), idx))
                })
                .collect(),
        );
        Self { segments, tree }
    }

    /// Positions of the segments lying within `superblock`, or of those
    /// intersecting it when none lies within. Ascending order.
    pub(crate) fn select(&self, superblock: &Superblock) -> Vec<usize> {
        let Some(bounds) = superblock.geometry.bounding_rect() else {
            return Vec::new();
        };
        let (min, max) = corners(bounds);
        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_corners(min, max))
            .map(|candidate| candidate.data)
            .collect();
        candidates.sort_unstable();

        let within: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&idx| superblock.geometry.contains(&self.segments[idx].geometry))
            .collect();
        if !within.is_empty() {
            return within;
        }

        candidates
            .into_iter()
            .filter(|&idx| superblock.geometry.intersects(&self.segments[idx].geometry))
            .collect()
    }

    pub(crate) fn segment(&self, idx: usize) -> &'a Segment {
        &self.segments[idx]
    }
}
