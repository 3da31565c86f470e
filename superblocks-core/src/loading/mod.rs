//! Configuration and input readers

mod config;
pub mod reader;

pub use config::{PipelineConfig, StreetTypeSet};
pub use reader::{
    parse_nodes, parse_point, parse_polygons, parse_segments, read_nodes, read_polygons,
    read_segments,
};
