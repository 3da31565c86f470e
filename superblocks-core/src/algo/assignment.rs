//! Block to superblock assignment

use geo::{BoundingRect, Contains, Polygon, Rect};
use log::{debug, info, warn};
use rayon::prelude::*;
use rstar::{
    AABB, RTree,
    primitives::{GeomWithData, Rectangle},
};

use crate::{
    geometry::{Crs, MetricProjection, combined_bounds, metric_distance},
    model::{Block, NO_SUPERBLOCK, Superblock, SuperblockId},
};

type IndexedSuperblock = GeomWithData<Rectangle<[f64; 2]>, usize>;

fn corners(rect: Rect<f64>) -> ([f64; 2], [f64; 2]) {
    ([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Give every block exactly one superblock id.
///
/// A block contained by a superblock takes that superblock's id (the lowest
/// id when several contain it). Any other block goes to the nearest
/// superblock, measured in a shared metric frame when both layers share a
/// coordinate frame and in native units otherwise; distance ties also go to
/// the lowest id. Only an empty superblock set leaves blocks at
/// [`NO_SUPERBLOCK`].
pub fn assign_blocks_to_superblocks(
    blocks: Vec<Block>,
    block_crs: Crs,
    superblocks: &[Superblock],
    superblock_crs: Crs,
) -> Vec<Block> {
    if blocks.is_empty() {
        return blocks;
    }
    if superblocks.is_empty() {
        warn!("No superblocks, {} blocks stay unassigned", blocks.len());
        return blocks
            .into_iter()
            .map(|block| Block {
                superblock_id: NO_SUPERBLOCK,
                ..block
            })
            .collect();
    }

    let tree: RTree<IndexedSuperblock> = RTree::bulk_load(
        superblocks
            .iter()
            .enumerate()
            .filter_map(|(idx, superblock)| {
                let (min, max) = corners(superblock.geometry.bounding_rect()?);
                Some(GeomWithData::new(Rectangle::from_corners(min, max), idx))
            })
            .collect(),
    );

    let projection = if block_crs == superblock_crs {
        MetricProjection::estimate(
            block_crs,
            combined_bounds(
                blocks
                    .iter()
                    .map(|b| &b.geometry)
                    .chain(superblocks.iter().map(|s| &s.geometry))
                    .filter_map(BoundingRect::bounding_rect),
            ),
        )
    } else {
        debug!("Blocks and superblocks use different frames, falling back to native distance");
        MetricProjection::Identity
    };

    let assigned: Vec<(Block, bool)> = blocks
        .into_par_iter()
        .map(|block| {
            if let Some(id) = containing_superblock(&tree, superblocks, &block.geometry) {
                (
                    Block {
                        superblock_id: id,
                        ..block
                    },
                    false,
                )
            } else {
                let id = nearest_superblock(&projection, superblocks, &block.geometry);
                (
                    Block {
                        superblock_id: id,
                        ..block
                    },
                    true,
                )
            }
        })
        .collect();

    let by_fallback = assigned.iter().filter(|(_, fallback)| *fallback).count();
    if by_fallback > 0 {
        info!("Assigned {by_fallback} uncontained blocks to their nearest superblock");
    }
    assigned.into_iter().map(|(block, _)| block).collect()
}

fn containing_superblock(
    tree: &RTree<IndexedSuperblock>,
    superblocks: &[Superblock],
    block: &Polygon<f64>,
) -> Option<SuperblockId> {
    let (min, max) = corners(block.bounding_rect()?);
    tree.locate_in_envelope_intersecting(&AABB::from_corners(min, max))
        .map(|candidate| &superblocks[candidate.data])
        .filter(|superblock| superblock.geometry.contains(block))
        .map(|superblock| superblock.id)
        .min()
}

fn nearest_superblock(
    projection: &MetricProjection,
    superblocks: &[Superblock],
    block: &Polygon<f64>,
) -> SuperblockId {
    superblocks
        .iter()
        .map(|superblock| {
            (
                metric_distance(projection, &superblock.geometry, block),
                superblock.id,
            )
        })
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map_or(NO_SUPERBLOCK, |(_, id)| id)
}
