//! Street-level analysis: capacity, classification and priority layers

pub mod capacity;
mod classify;
mod priority;

pub use capacity::{estimate_capacity, extract_numeric, is_affirmative_oneway};
pub use classify::{Classification, classify_streets};
pub use priority::{
    HeritagePriority, MajorRoad, MajorRoadReason, detect_major_roads,
    identify_heritage_priorities, prepare_priority_zone,
};
