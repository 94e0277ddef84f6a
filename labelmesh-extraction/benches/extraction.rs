//! Benchmarks for single-block extraction and chunked multi-resolution meshing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use labelmesh_core::{ArrayField, Bounds, Field};
use labelmesh_extraction::{
    extract, Criterion as Foreground, ExtractionConfig, ExtractionScheduler, ThreadPoolConfig,
    VertexSharing,
};

fn sphere_volume(size: i64, label: u32) -> ArrayField<u32> {
    let bounds = Bounds::new([0, 0, 0], [size - 1, size - 1, size - 1]);
    let mut field = ArrayField::new(bounds, 0).unwrap();
    let center = size / 2;
    let radius = size / 3;
    for [x, y, z] in bounds.indices() {
        let d2 = (x - center).pow(2) + (y - center).pow(2) + (z - center).pow(2);
        if d2 <= radius * radius {
            field.set([x, y, z], label).unwrap();
        }
    }
    field
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    for &size in &[32, 64, 96] {
        let field = sphere_volume(size, 7);
        group.bench_with_input(BenchmarkId::new("sphere", size), &field, |b, field| {
            b.iter(|| {
                let mesh = extract(
                    black_box(field),
                    field.bounds(),
                    [1, 1, 1],
                    7.0,
                    Foreground::Exact,
                );
                black_box(mesh);
            });
        });
    }

    group.finish();
}

fn bench_extract_all(c: &mut Criterion) {
    let field = sphere_volume(128, 7);
    let mut group = c.benchmark_group("extract_all");
    group.sample_size(10);

    for sharing in [VertexSharing::PerChunk, VertexSharing::GlobalId] {
        let config = ExtractionConfig::default()
            .with_iso_level(7.0)
            .with_chunk_size([32, 32, 32])
            .with_voxel_strides(vec![8, 4, 2, 1])
            .with_vertex_sharing(sharing);
        let scheduler = ExtractionScheduler::new(config, &ThreadPoolConfig::default()).unwrap();

        group.bench_function(BenchmarkId::new("sphere_128", format!("{:?}", sharing)), |b| {
            b.iter(|| {
                let levels = scheduler.extract_all(black_box(&field)).unwrap();
                black_box(levels);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extract, bench_extract_all);
criterion_main!(benches);
