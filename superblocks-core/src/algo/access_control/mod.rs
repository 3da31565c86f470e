//! Access control inside superblocks: one-way conversions, modal filters
//! and permeability scoring
//!
//! Every superblock selects the internal segments lying within it (or, when
//! none does, those crossing it) and works on that subset only. The direction
//! heuristic and the filter length check are pluggable through
//! [`DirectionPolicy`] and [`LengthPolicy`].

mod directions;
mod filters;
mod permeability;
mod policy;
mod selection;

pub use directions::calculate_street_directions;
pub use filters::identify_modal_filters;
pub use permeability::analyze_permeability;
pub use policy::{DirectionPolicy, DominantAxis, LengthPolicy, MetricLength, NativeLength};
