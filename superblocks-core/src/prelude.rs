pub use crate::Error;
pub use crate::PipelineConfig;

// Pipeline
pub use crate::pipeline::{Pipeline, PipelineState};

// Input and output
pub use crate::export::write_outputs;
pub use crate::loading::{read_nodes, read_polygons, read_segments};

// Domain types
pub use crate::geometry::Crs;
pub use crate::metrics::NetworkMetrics;
pub use crate::model::{
    AccessControl, Block, Direction, ModalFilter, PermeabilityRecord, RawSegment, Segment,
    StreetNode, StreetType, Superblock, SuperblockId, TagValue,
};
pub use crate::streets::{Classification, HeritagePriority, MajorRoad};

// Replaceable heuristics
pub use crate::algo::access_control::{
    DirectionPolicy, DominantAxis, LengthPolicy, MetricLength, NativeLength,
};
