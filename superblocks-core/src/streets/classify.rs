use log::{info, warn};

use crate::{PipelineConfig, algo::quantile::quantile, model::Segment};

/// Boundary/internal split of a segment set
///
/// The two sets are not exclusive: a boundary-typed street below the
/// threshold is internal, and an internal-typed street at or above it can
/// appear in both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub boundary: Vec<Segment>,
    pub internal: Vec<Segment>,
    /// Capacity quantile used as the split, `None` for an empty network
    pub threshold: Option<f64>,
}

impl Classification {
    pub fn is_boundary(&self, segment: &Segment) -> bool {
        self.boundary.iter().any(|s| s.id == segment.id)
    }
}

/// Split segments into boundary and internal streets.
///
/// `boundary` holds segments whose type is in the boundary set and whose
/// capacity reaches the configured quantile, `internal` those whose type is in
/// the internal set or whose capacity is below it.
pub fn classify_streets(segments: &[Segment], config: &PipelineConfig) -> Classification {
    let Some(threshold) = quantile(
        segments.iter().map(|s| s.capacity),
        config.boundary_capacity_quantile,
    ) else {
        warn!("No segments to classify");
        return Classification::default();
    };

    let boundary: Vec<Segment> = segments
        .iter()
        .filter(|s| s.matches_type(&config.boundary_highway_types) && s.capacity >= threshold)
        .cloned()
        .collect();
    let internal: Vec<Segment> = segments
        .iter()
        .filter(|s| s.matches_type(&config.internal_highway_types) || s.capacity < threshold)
        .cloned()
        .collect();

    info!(
        "Classified {} segments: {} boundary, {} internal (threshold {threshold:.1})",
        segments.len(),
        boundary.len(),
        internal.len()
    );

    Classification {
        boundary,
        internal,
        threshold: Some(threshold),
    }
}
