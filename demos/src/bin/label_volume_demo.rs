//! Mesh a synthetic multi-label volume at several resolutions
//!
//! Run with `RUST_LOG=info` (or `debug` for per-chunk output).

use anyhow::{Context, Result};
use labelmesh_core::{ArrayField, Bounds, Drawable};
use labelmesh_extraction::{
    Criterion, ExtractionConfig, ExtractionScheduler, SamplingStrategy, ThreadPoolConfig,
    VertexSharing,
};

const SIZE: i64 = 96;

/// Three overlapping "cells" and a slab, each with its own label id
fn build_label_volume() -> Result<ArrayField<u64>> {
    let bounds = Bounds::new([0, 0, 0], [SIZE - 1, SIZE - 1, SIZE - 1]);
    let mut volume = ArrayField::new(bounds, 0u64)?;

    let blobs: [([i64; 3], i64, u64); 3] = [
        ([30, 34, 40], 18, 101),
        ([62, 50, 44], 22, 202),
        ([48, 70, 60], 14, 303),
    ];
    for index in bounds.indices() {
        for &(center, radius, label) in &blobs {
            let d2: i64 = (0..3).map(|axis| (index[axis] - center[axis]).pow(2)).sum();
            if d2 <= radius * radius {
                volume.set(index, label)?;
            }
        }
    }
    volume.fill_region(&Bounds::new([8, 8, 84], [88, 88, 90]), 404);

    Ok(volume)
}

fn main() -> Result<()> {
    env_logger::init();

    let volume = build_label_volume().context("building label volume")?;
    let labels = [101u64, 202, 303, 404];

    for label in labels {
        let config = ExtractionConfig::default()
            .with_iso_level(label as f64)
            .with_criterion(Criterion::Exact)
            .with_chunk_size([32, 32, 32])
            .with_voxel_strides(vec![8, 4, 2, 1])
            .with_vertex_sharing(VertexSharing::GlobalId)
            .with_sampling(SamplingStrategy::Direct);
        let scheduler = ExtractionScheduler::new(config, &ThreadPoolConfig::default())?;

        log::info!("Meshing label {} on {} threads", label, scheduler.num_threads());
        scheduler
            .extract_all_with(&volume, |level| {
                let mesh = level.volume_space_mesh();
                let (min, max) = mesh.bounding_box();
                println!(
                    "label {:>3} stride {:>2} chunks {:>4} vertices {:>7} triangles {:>7} {:?}",
                    label,
                    level.stride,
                    level.chunk_count,
                    mesh.vertex_count(),
                    mesh.face_count(),
                    level.elapsed
                );
                println!(
                    "    bounds [{:.1}, {:.1}, {:.1}]..[{:.1}, {:.1}, {:.1}]",
                    min.x, min.y, min.z, max.x, max.y, max.z
                );
            })
            .with_context(|| format!("meshing label {}", label))?;
    }

    Ok(())
}
