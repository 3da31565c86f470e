//! Replaceable heuristics behind the access-control decisions

use geo::{Euclidean, Length, LineString};

use crate::geometry::MetricProjection;

/// Decides which way a newly one-way street runs
pub trait DirectionPolicy: Sync {
    /// `true` to allow travel along the digitisation order of `geometry`
    fn is_forward(&self, geometry: &LineString<f64>) -> bool;
}

/// Run one-way streets eastward or northward along their dominant axis.
///
/// Compares the end-to-end displacement of the segment: when the east-west
/// component is larger the street runs east, otherwise it runs north.
#[derive(Debug, Clone, Copy, Default)]
pub struct DominantAxis;

impl DirectionPolicy for DominantAxis {
    fn is_forward(&self, geometry: &LineString<f64>) -> bool {
        let (Some(start), Some(end)) = (geometry.0.first(), geometry.0.last()) else {
            return true;
        };
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if dx.abs() > dy.abs() { dx > 0.0 } else { dy > 0.0 }
    }
}

/// Measures segment length for the minimum filter length check
pub trait LengthPolicy: Sync {
    fn length(&self, geometry: &LineString<f64>, projection: &MetricProjection) -> f64;
}

/// Length in metres in the local metric frame
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricLength;

impl LengthPolicy for MetricLength {
    fn length(&self, geometry: &LineString<f64>, projection: &MetricProjection) -> f64 {
        Euclidean.length(&projection.project(geometry))
    }
}

/// Length in the native units of the data, ignoring the projection.
///
/// On geographic data this compares degrees against the metre threshold, so
/// practically no street qualifies for a filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLength;

impl LengthPolicy for NativeLength {
    fn length(&self, geometry: &LineString<f64>, _projection: &MetricProjection) -> f64 {
        Euclidean.length(geometry)
    }
}
