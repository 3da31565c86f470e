use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use superblocks_core::{
    loading::parse_point,
    prelude::*,
};

/// Superblock planning for a street network stored as GeoJSON
#[derive(Parser, Debug, Clone)]
#[command(name = "superblocks", version, about)]
struct Args {
    /// Street segments (FeatureCollection of LineStrings)
    #[arg(short, long)]
    segments: PathBuf,

    /// TOML file with a `[pipeline]` table and an optional `crs`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Street nodes (FeatureCollection of Points), used for the network centre
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Polygons the priority zone is derived from
    #[arg(long)]
    priority_zone: Option<PathBuf>,

    /// Fallback network centre as `x,y`
    #[arg(long)]
    centre: Option<String>,

    /// Coordinate frame of the input, `wgs84` or `metric`
    #[arg(long, value_parser = parse_crs)]
    crs: Option<Crs>,

    /// Measure filter candidates in native units instead of metres
    #[arg(long)]
    native_length: bool,

    /// Directory for the output layers
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Print the metrics as JSON to stdout
    #[arg(long)]
    print_metrics: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunnerConfig {
    crs: Option<Crs>,
    pipeline: PipelineConfig,
}

fn parse_crs(value: &str) -> Result<Crs, String> {
    match value.to_ascii_lowercase().as_str() {
        "wgs84" | "epsg:4326" => Ok(Crs::Wgs84),
        "metric" => Ok(Crs::Metric),
        other => Err(format!("unknown coordinate frame '{other}'")),
    }
}

fn load_config(path: Option<&Path>) -> Result<RunnerConfig> {
    let Some(path) = path else {
        return Ok(RunnerConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let runner = load_config(args.config.as_deref())?;
    let crs = args.crs.or(runner.crs).unwrap_or_default();

    let mut pipeline = Pipeline::new(runner.pipeline).context("invalid pipeline configuration")?;
    if args.native_length {
        pipeline = pipeline.with_length_policy(NativeLength);
    }

    let segments = read_segments(&args.segments)
        .with_context(|| format!("reading segments {}", args.segments.display()))?;
    if segments.is_empty() {
        bail!("{} contains no line features", args.segments.display());
    }
    info!(
        "Loaded {} segments for {}",
        segments.len(),
        pipeline.config().place_name
    );

    let mut state = PipelineState::new(crs, segments);
    if let Some(path) = &args.nodes {
        let nodes =
            read_nodes(path).with_context(|| format!("reading nodes {}", path.display()))?;
        state = state.with_nodes(nodes);
    }
    if let Some(path) = &args.priority_zone {
        let polygons = read_polygons(path)
            .with_context(|| format!("reading priority zone {}", path.display()))?;
        state = state.with_priority_candidates(polygons);
    }
    if let Some(centre) = &args.centre {
        state = state.with_fallback_centre(parse_point(centre)?);
    }

    let state = pipeline.run(state)?;
    let written = write_outputs(&state, &args.output)
        .with_context(|| format!("writing outputs to {}", args.output.display()))?;
    info!("Wrote {} files to {}", written.len(), args.output.display());

    if args.print_metrics
        && let Some(metrics) = &state.metrics
    {
        println!("{}", serde_json::to_string_pretty(metrics)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_config_reads_pipeline_table() {
        let config: RunnerConfig = toml::from_str(
            r#"
            crs = "metric"

            [pipeline]
            place_name = "Budapest, Hungary"
            boundary_capacity_quantile = 0.7
            "#,
        )
        .unwrap();
        assert_eq!(config.crs, Some(Crs::Metric));
        assert_eq!(config.pipeline.place_name, "Budapest, Hungary");
        assert!((config.pipeline.boundary_capacity_quantile - 0.7).abs() < 1e-12);
        assert!((config.pipeline.oneway_capacity_quantile - 0.4).abs() < 1e-12);
    }

    #[test]
    fn crs_names_are_case_insensitive() {
        assert_eq!(parse_crs("WGS84"), Ok(Crs::Wgs84));
        assert!(parse_crs("mercator").is_err());
    }
}
