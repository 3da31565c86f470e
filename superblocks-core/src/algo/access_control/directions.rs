use log::{info, warn};
use rayon::prelude::*;

use super::{DirectionPolicy, selection::SegmentIndex};
use crate::{
    PipelineConfig,
    algo::quantile::quantile,
    model::{AccessControl, Segment, Superblock},
};

/// Decide one-way conversions for internal streets, superblock by superblock.
///
/// Within each superblock, segments already one-way in the source data
/// become one-way forward, and the remaining segments at or below the
/// `oneway_capacity_quantile` of the superblock's selected capacities become
/// one-way in the direction chosen by `policy`. All other segments are open.
///
/// Superblocks are processed in parallel and their conversions applied in id
/// order. A superblock that selects a segment without converting it leaves
/// the segment as it is, so a conversion is never undone by a later superblock.
pub fn calculate_street_directions(
    internal: &[Segment],
    superblocks: &[Superblock],
    config: &PipelineConfig,
    policy: &dyn DirectionPolicy,
) -> Vec<Segment> {
    let mut directed: Vec<Segment> = internal
        .iter()
        .map(|segment| Segment {
            access: AccessControl::Open,
            ..segment.clone()
        })
        .collect();

    if internal.is_empty() || superblocks.is_empty() {
        warn!("Cannot calculate street directions without internal streets and superblocks");
        return directed;
    }

    let index = SegmentIndex::new(internal);
    let mut ordered: Vec<&Superblock> = superblocks.iter().collect();
    ordered.sort_by_key(|superblock| superblock.id);

    let decisions: Vec<Vec<(usize, AccessControl)>> = ordered
        .par_iter()
        .map(|superblock| superblock_directions(&index, superblock, config, policy))
        .collect();

    for (idx, access) in decisions.into_iter().flatten() {
        directed[idx].access = access;
    }

    let oneway = directed.iter().filter(|s| s.access.is_oneway()).count();
    info!(
        "Calculated street directions: {oneway} one-way, {} two-way",
        directed.len() - oneway
    );
    directed
}

fn superblock_directions(
    index: &SegmentIndex<'_>,
    superblock: &Superblock,
    config: &PipelineConfig,
    policy: &dyn DirectionPolicy,
) -> Vec<(usize, AccessControl)> {
    let selected = index.select(superblock);
    let Some(threshold) = quantile(
        selected.iter().map(|&idx| index.segment(idx).capacity),
        config.oneway_capacity_quantile,
    ) else {
        return Vec::new();
    };

    selected
        .into_iter()
        .filter_map(|idx| {
            let segment = index.segment(idx);
            if segment.source_oneway {
                Some((idx, AccessControl::one_way(true)))
            } else if segment.capacity <= threshold {
                Some((idx, AccessControl::one_way(policy.is_forward(&segment.geometry))))
            } else {
                None
            }
        })
        .collect()
}
