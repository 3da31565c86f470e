//! Blocks: the minimal faces enclosed by internal streets

use log::{info, warn};

use crate::{
    PipelineConfig,
    geometry::{Crs, clean_polygons, polygonize},
    model::{Block, NO_SUPERBLOCK, Segment},
};

/// Polygonize internal streets into cleaned blocks with ids `0..n`.
///
/// An empty street set, or a network that encloses no face, yields no blocks.
pub fn build_blocks(internal: &[Segment], crs: Crs, config: &PipelineConfig) -> Vec<Block> {
    if internal.is_empty() {
        warn!("No internal streets, no blocks to build");
        return Vec::new();
    }

    let faces = polygonize(internal.iter().map(|s| &s.geometry));
    let cleaned = clean_polygons(
        faces,
        crs,
        config.block_min_area_m2,
        config.clean_tolerance,
    );

    let blocks: Vec<Block> = cleaned
        .into_iter()
        .enumerate()
        .map(|(id, geometry)| Block {
            id,
            geometry,
            superblock_id: NO_SUPERBLOCK,
        })
        .collect();

    info!(
        "Built {} blocks from {} internal streets",
        blocks.len(),
        internal.len()
    );
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccessControl;
    use approx::assert_relative_eq;
    use geo::{Area, LineString, line_string};

    fn street(id: usize, geometry: LineString<f64>) -> Segment {
        Segment {
            id,
            geometry,
            name: None,
            highway: None,
            lanes: 2.0,
            maxspeed: 30.0,
            width: 7.0,
            capacity: 210.0,
            capacity_per_lane: 105.0,
            source_oneway: false,
            access: AccessControl::Open,
        }
    }

    /// Three horizontal and three vertical streets 100 m apart
    fn grid() -> Vec<Segment> {
        let mut streets = Vec::new();
        for i in 0..3 {
            let offset = f64::from(i) * 100.0;
            streets.push(line_string![(x: 0.0, y: offset), (x: 200.0, y: offset)]);
            streets.push(line_string![(x: offset, y: 0.0), (x: offset, y: 200.0)]);
        }
        streets
            .into_iter()
            .enumerate()
            .map(|(id, geometry)| street(id, geometry))
            .collect()
    }

    #[test]
    fn grid_yields_four_blocks_with_sequential_ids() {
        let blocks = build_blocks(&grid(), Crs::Metric, &PipelineConfig::default());
        assert_eq!(blocks.len(), 4);
        for (expected, block) in blocks.iter().enumerate() {
            assert_eq!(block.id, expected);
            assert_relative_eq!(block.geometry.unsigned_area(), 10_000.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn open_network_yields_no_blocks() {
        let streets = vec![
            street(0, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)]),
            street(1, line_string![(x: 100.0, y: 0.0), (x: 100.0, y: 100.0)]),
        ];
        assert!(build_blocks(&streets, Crs::Metric, &PipelineConfig::default()).is_empty());
    }

    #[test]
    fn faces_below_the_floor_are_dropped() {
        let config = PipelineConfig {
            block_min_area_m2: 20_000.0,
            superblock_min_area_m2: 50_000.0,
            ..PipelineConfig::default()
        };
        assert!(build_blocks(&grid(), Crs::Metric, &config).is_empty());
    }

    #[test]
    fn no_internal_streets_is_not_an_error() {
        assert!(build_blocks(&[], Crs::Metric, &PipelineConfig::default()).is_empty());
    }
}
