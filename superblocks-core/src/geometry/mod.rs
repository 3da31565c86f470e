//! Geometry primitives shared by the block and superblock builders
//!
//! Everything that needs a physical distance or area goes through a
//! [`MetricProjection`] estimated from the data, so metre-valued policy numbers
//! are never applied to degree coordinates.

mod ops;
mod polygonize;
mod projection;

pub use ops::{
    buffer_lines_in_metres, buffer_point_in_metres, buffer_polygons_in_metres, clean_polygons,
    dissolve, explode, metric_area, metric_length,
};
pub(crate) use ops::metric_distance;
pub use polygonize::polygonize;
pub use projection::{Crs, MetricProjection, combined_bounds};
