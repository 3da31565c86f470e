use log::info;

use super::selection::SegmentIndex;
use crate::model::{PermeabilityRecord, Segment, Superblock};

/// Count one-way and two-way internal streets per superblock.
///
/// `permeability_score` is the share of streets left two-way (0 with no
/// streets), `accessibility_score` is 1 when the superblock has any internal
/// street at all.
pub fn analyze_permeability(
    directed: &[Segment],
    superblocks: &[Superblock],
) -> Vec<PermeabilityRecord> {
    let index = SegmentIndex::new(directed);

    let records: Vec<PermeabilityRecord> = superblocks
        .iter()
        .map(|superblock| {
            let selected = index.select(superblock);
            let total = selected.len();
            let oneway = selected
                .iter()
                .filter(|&&idx| index.segment(idx).access.is_oneway())
                .count();
            let twoway = total - oneway;

            #[allow(clippy::cast_precision_loss)]
            let permeability_score = if total > 0 {
                twoway as f64 / total as f64
            } else {
                0.0
            };

            PermeabilityRecord {
                superblock_id: superblock.id,
                total_internal_streets: total,
                oneway_streets: oneway,
                twoway_streets: twoway,
                permeability_score,
                accessibility_score: if total > 0 { 1.0 } else { 0.0 },
            }
        })
        .collect();

    info!("Analyzed permeability for {} superblocks", records.len());
    records
}
