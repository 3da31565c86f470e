//! Superblocks: cells enclosed by buffered boundary streets

use geo::{Area, BooleanOps, Contains, InteriorPoint, LineString, Polygon};
use log::{debug, info, warn};

use crate::{
    PipelineConfig,
    geometry::{Crs, buffer_lines_in_metres, clean_polygons, explode, polygonize},
    model::{Segment, Superblock},
};

/// Build superblock polygons from boundary streets.
///
/// Boundary streets are buffered by `boundary_buffer_metres` so near-miss
/// junctions close, and the faces enclosed by the buffered corridors are
/// polygonized and cleaned with `superblock_min_area_m2`. When `exclusions`
/// is given its buffered union is cut out of every superblock. Ids are
/// assigned `0..n` after all splitting.
pub fn build_superblocks(
    boundary: &[Segment],
    crs: Crs,
    config: &PipelineConfig,
    exclusions: Option<&[Segment]>,
) -> Vec<Superblock> {
    if boundary.is_empty() {
        warn!("No boundary streets, no superblocks to build");
        return Vec::new();
    }

    let lines: Vec<LineString<f64>> = boundary.iter().map(|s| s.geometry.clone()).collect();
    let faces = enclosed_faces(&lines, crs, config.boundary_buffer_metres);
    let mut polygons = clean_polygons(
        faces,
        crs,
        config.superblock_min_area_m2,
        config.clean_tolerance,
    );

    if let Some(exclusions) = exclusions.filter(|e| !e.is_empty()) {
        let before = polygons.len();
        polygons = subtract_corridors(polygons, exclusions, crs, config.major_road_buffer_metres);
        debug!(
            "Excluding {} corridor segments split {before} superblocks into {}",
            exclusions.len(),
            polygons.len()
        );
    }

    let superblocks: Vec<Superblock> = polygons
        .into_iter()
        .zip(0..)
        .map(|(geometry, id)| Superblock { id, geometry })
        .collect();

    info!("Constructed {} superblock polygons", superblocks.len());
    superblocks
}

/// Faces enclosed by `lines` once they are widened into corridors
fn enclosed_faces(lines: &[LineString<f64>], crs: Crs, buffer_metres: f64) -> Vec<Polygon<f64>> {
    if buffer_metres <= 0.0 {
        return polygonize(lines);
    }

    let corridors = buffer_lines_in_metres(lines, crs, buffer_metres);
    let rings: Vec<&LineString<f64>> = corridors
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .collect();

    polygonize(rings)
        .into_iter()
        .filter(|face| {
            face.interior_point()
                .is_some_and(|point| !corridors.contains(&point))
        })
        .collect()
}

fn subtract_corridors(
    polygons: Vec<Polygon<f64>>,
    exclusions: &[Segment],
    crs: Crs,
    buffer_metres: f64,
) -> Vec<Polygon<f64>> {
    let lines: Vec<LineString<f64>> = exclusions.iter().map(|s| s.geometry.clone()).collect();
    let corridors = buffer_lines_in_metres(&lines, crs, buffer_metres);
    if corridors.0.is_empty() {
        return polygons;
    }

    polygons
        .iter()
        .flat_map(|polygon| explode(polygon.difference(&corridors)))
        .filter(|part| part.unsigned_area() > 0.0)
        .collect()
}
