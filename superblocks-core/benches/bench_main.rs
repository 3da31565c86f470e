use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use geo::line_string;
use superblocks_core::{
    geometry::{Crs, polygonize},
    model::{RawSegment, TagValue},
    prelude::*,
};

/// Square grid of `cells` x `cells` blocks, 100 m apart, with every fourth
/// street an arterial
fn grid_network(cells: u32) -> Vec<RawSegment> {
    let extent = f64::from(cells) * 100.0;
    let mut segments = Vec::new();
    for i in 0..=cells {
        let offset = f64::from(i) * 100.0;
        let (highway, lanes) = if i % 4 == 0 {
            ("primary", 4.0)
        } else {
            ("residential", 1.0)
        };
        for geometry in [
            line_string![(x: 0.0, y: offset), (x: extent, y: offset)],
            line_string![(x: offset, y: 0.0), (x: offset, y: extent)],
        ] {
            let mut segment = RawSegment::new(geometry).with_highway(highway);
            segment.lanes = Some(TagValue::Number(lanes));
            segments.push(segment);
        }
    }
    segments
}

fn bench_polygonize(c: &mut Criterion) {
    let lines: Vec<_> = grid_network(24).into_iter().map(|s| s.geometry).collect();
    c.bench_function("polygonize_grid_24", |b| {
        b.iter(|| black_box(polygonize(black_box(&lines))));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::new(PipelineConfig::default()).expect("default config is valid");
    let segments = grid_network(16);

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    group.bench_function("run_grid_16", |b| {
        b.iter(|| {
            let state = PipelineState::new(Crs::Metric, segments.clone());
            black_box(pipeline.run(state).expect("pipeline runs"))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_polygonize, bench_pipeline);
criterion_main!(benches);
