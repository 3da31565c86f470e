use geo::{BoundingRect, LineString, Point};
use log::info;
use rayon::prelude::*;

use super::{LengthPolicy, selection::SegmentIndex};
use crate::{
    PipelineConfig,
    algo::quantile::quantile,
    geometry::{Crs, MetricProjection, combined_bounds},
    model::{FilterReason, ModalFilter, Segment, Superblock},
};

/// Place modal filters on the longer, busier internal streets of each superblock.
///
/// Candidates are the superblock's selected internal segments, restricted to
/// capacity at or above `filter_capacity_quantile` when one is configured,
/// and longer than `min_filter_length_m` as measured by `length_policy`. Each
/// candidate gets one filter halfway along its length.
pub fn identify_modal_filters(
    internal: &[Segment],
    superblocks: &[Superblock],
    crs: Crs,
    config: &PipelineConfig,
    length_policy: &dyn LengthPolicy,
) -> Vec<ModalFilter> {
    if internal.is_empty() || superblocks.is_empty() {
        return Vec::new();
    }

    let projection = MetricProjection::estimate(
        crs,
        combined_bounds(internal.iter().filter_map(|s| s.geometry.bounding_rect())),
    );
    let index = SegmentIndex::new(internal);
    let mut ordered: Vec<&Superblock> = superblocks.iter().collect();
    ordered.sort_by_key(|superblock| superblock.id);

    let filters: Vec<ModalFilter> = ordered
        .par_iter()
        .flat_map_iter(|superblock| {
            superblock_filters(&index, superblock, &projection, config, length_policy)
        })
        .collect();

    info!("Identified {} modal filter locations", filters.len());
    filters
}

fn superblock_filters(
    index: &SegmentIndex<'_>,
    superblock: &Superblock,
    projection: &MetricProjection,
    config: &PipelineConfig,
    length_policy: &dyn LengthPolicy,
) -> Vec<ModalFilter> {
    let selected = index.select(superblock);
    let threshold = config.filter_capacity_quantile.and_then(|q| {
        quantile(selected.iter().map(|&idx| index.segment(idx).capacity), q)
    });

    selected
        .into_iter()
        .map(|idx| index.segment(idx))
        .filter(|segment| threshold.is_none_or(|threshold| segment.capacity >= threshold))
        .filter(|segment| {
            length_policy.length(&segment.geometry, projection) > config.min_filter_length_m
        })
        .filter_map(|segment| {
            let midpoint = halfway(&projection.project(&segment.geometry))?;
            Some(ModalFilter {
                geometry: projection.unproject(&midpoint),
                street_name: segment.display_name(),
                superblock_id: superblock.id,
                reason: FilterReason::ThroughRoutePrevention,
            })
        })
        .collect()
}

/// Point halfway along a line by length
fn halfway(line: &LineString<f64>) -> Option<Point<f64>> {
    let lengths: Vec<f64> = line
        .lines()
        .map(|segment| {
            let delta = segment.delta();
            delta.x.hypot(delta.y)
        })
        .collect();
    let total: f64 = lengths.iter().sum();
    if total <= 0.0 {
        return line.0.first().map(|&coord| Point::from(coord));
    }

    let mut remaining = total / 2.0;
    for (segment, length) in line.lines().zip(lengths) {
        if remaining <= length {
            let fraction = remaining / length;
            return Some(Point::new(
                segment.start.x + segment.delta().x * fraction,
                segment.start.y + segment.delta().y * fraction,
            ));
        }
        remaining -= length;
    }
    line.0.last().map(|&coord| Point::from(coord))
}
