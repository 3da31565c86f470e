//! GeoJSON and JSON writers for every derived layer

mod to_geojson;

use std::{
    fs,
    path::{Path, PathBuf},
};

use geojson::FeatureCollection;
use log::info;
use serde::Serialize;

pub use to_geojson::{
    blocks_to_geojson, heritage_priorities_to_geojson, major_roads_to_geojson,
    modal_filters_to_geojson, priority_zone_to_geojson, segments_to_geojson,
    superblocks_to_geojson,
};

use crate::{Error, pipeline::PipelineState};

fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<(), Error> {
    fs::write(path, collection.to_string())?;
    Ok(())
}

/// Pretty-printed JSON of any serialisable layer
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|e| Error::InvalidData(e.to_string()))
}

/// Write every layer present in `state` into `dir`.
///
/// Layers whose stage has not run are skipped. Returns the written paths.
pub fn write_outputs(state: &PipelineState, dir: &Path) -> Result<Vec<PathBuf>, Error> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let mut layer = |name: &str, collection: FeatureCollection| -> Result<(), Error> {
        let path = dir.join(name);
        write_collection(&path, &collection)?;
        written.push(path);
        Ok(())
    };

    if let Some(classification) = &state.classification {
        layer("boundary_streets.geojson", segments_to_geojson(&classification.boundary)?)?;
    }
    if let Some(directed) = &state.directed_streets {
        layer("internal_streets.geojson", segments_to_geojson(directed)?)?;
    }
    if let Some(blocks) = &state.blocks {
        layer("blocks.geojson", blocks_to_geojson(blocks)?)?;
    }
    if let Some(superblocks) = &state.superblocks {
        layer(
            "superblocks.geojson",
            superblocks_to_geojson(superblocks, state.crs)?,
        )?;
    }
    if let Some(filters) = &state.modal_filters {
        layer("modal_filters.geojson", modal_filters_to_geojson(filters)?)?;
    }
    if let Some(roads) = &state.major_roads {
        layer("major_roads.geojson", major_roads_to_geojson(roads)?)?;
    }
    if let Some(priorities) = &state.heritage_priorities {
        layer(
            "heritage_priority_streets.geojson",
            heritage_priorities_to_geojson(priorities)?,
        )?;
    }
    if let Some(zone) = &state.priority_zone {
        layer("priority_zone.geojson", priority_zone_to_geojson(zone)?)?;
    }

    if let Some(permeability) = &state.permeability {
        let path = dir.join("permeability.json");
        fs::write(&path, to_json_string(permeability)?)?;
        written.push(path);
    }
    if let Some(metrics) = &state.metrics {
        let path = dir.join("metrics.json");
        fs::write(&path, to_json_string(metrics)?)?;
        written.push(path);
    }

    info!("Wrote {} output files to {}", written.len(), dir.display());
    Ok(written)
}
