//! Data model for the superblock analysis
//!
//! Street segments in their raw and enriched forms, the polygon layers derived
//! from them and the access-control records produced per superblock.

pub mod access;
pub mod polygons;
pub mod segment;

pub use access::{AccessControl, AccessMode, Direction, FilterReason, ModalFilter, PermeabilityRecord};
pub use polygons::{Block, NO_SUPERBLOCK, Superblock, SuperblockId};
pub use segment::{RawSegment, Segment, SegmentId, StreetNode, StreetType, TagValue};
