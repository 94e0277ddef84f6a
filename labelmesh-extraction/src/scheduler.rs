//! Parallel multi-resolution extraction
//!
//! For every voxel stride the field is partitioned, one Marching Cubes task
//! per chunk runs on the scheduler's rayon pool, and finished chunk meshes
//! are merged on the calling thread in the order they complete.

use crate::config::{ExtractionConfig, SamplingStrategy, VertexSharing};
use crate::marching_cubes::{CellMesh, EdgeId, MarchingCubes};
use crate::parallel::ThreadPoolConfig;
use crate::partition::{partition_with_stride, Chunk};
use crate::sampler::LatticeView;
use labelmesh_core::{
    ArrayField, Bounds, Error, Field, Index3, Result, Transform3D, Transformable, TriangleMesh,
    Vector3f,
};
use rayon::ThreadPool;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Aggregate mesh of one voxel stride
#[derive(Debug, Clone)]
pub struct ResolutionLevel {
    pub stride: i64,
    /// Merged mesh in stride-lattice units
    pub mesh: TriangleMesh,
    pub chunk_count: usize,
    /// Cells that produced geometry, summed over chunks
    pub active_cells: usize,
    pub elapsed: Duration,
}

impl ResolutionLevel {
    pub fn voxel_stride(&self) -> Index3 {
        [self.stride; 3]
    }

    /// The level mesh scaled to field index units
    pub fn volume_space_mesh(&self) -> TriangleMesh {
        let mut mesh = self.mesh.clone();
        let scale = self.stride as f32;
        mesh.transform(&Transform3D::scaling(Vector3f::new(scale, scale, scale)));
        mesh
    }
}

/// Runs chunked extraction on a dedicated thread pool
pub struct ExtractionScheduler {
    config: ExtractionConfig,
    pool: ThreadPool,
}

impl ExtractionScheduler {
    /// Validate `config` and build the worker pool
    pub fn new(config: ExtractionConfig, pool_config: &ThreadPoolConfig) -> Result<Self> {
        config.validate()?;
        let pool = pool_config.build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Mesh every configured stride, coarsest first
    pub fn extract_all<F: Field + ?Sized>(&self, field: &F) -> Result<Vec<ResolutionLevel>> {
        let mut levels = Vec::with_capacity(self.config.voxel_strides.len());
        self.extract_all_with(field, |level| levels.push(level))?;
        Ok(levels)
    }

    /// Mesh every configured stride, handing each level over as soon as it is merged
    ///
    /// Stops at the first failing stride; levels delivered before it stay valid.
    pub fn extract_all_with<F, C>(&self, field: &F, mut on_level: C) -> Result<()>
    where
        F: Field + ?Sized,
        C: FnMut(ResolutionLevel),
    {
        for stride in self.config.ordered_strides() {
            on_level(self.extract_level(field, stride)?);
        }
        Ok(())
    }

    /// Mesh a single uniform stride
    pub fn extract_level<F: Field + ?Sized>(
        &self,
        field: &F,
        stride: i64,
    ) -> Result<ResolutionLevel> {
        if stride < 1 {
            return Err(Error::InvalidExtractionConfig(format!(
                "voxel stride must be at least 1, got {}",
                stride
            )));
        }

        let start = Instant::now();
        let voxel_stride = [stride; 3];
        // Saturated sizes still partition into one chunk per axis
        let chunk_size = self.config.chunk_size.map(|cells| cells.saturating_mul(stride));
        let chunks = partition_with_stride(field, chunk_size, voxel_stride)?;
        let field_bounds = field.bounds();
        let engine = MarchingCubes::new(self.config.engine_config());
        let sampling = self.config.sampling;

        let (sender, receiver) = flume::unbounded();
        let abort = AtomicBool::new(false);
        let mut merger = LevelMerger::new(self.config.vertex_sharing, self.config.compute_normals);

        let outcome = self.pool.in_place_scope(|scope| {
            for chunk in &chunks {
                let sender = sender.clone();
                let engine = &engine;
                let abort = &abort;
                scope.spawn(move |_| {
                    if abort.load(Ordering::Relaxed) {
                        return;
                    }
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        mesh_chunk(field, &field_bounds, chunk, voxel_stride, engine, sampling)
                    }));
                    let result = match result {
                        Ok(Ok(part)) => Ok(part),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(payload) => Err(panic_message(payload.as_ref())),
                    };
                    // The receiver outlives the scope
                    let _ = sender.send((chunk.index, result));
                });
            }
            drop(sender);

            for (index, result) in receiver.iter() {
                match result {
                    Ok(part) => merger.push(part),
                    Err(message) => {
                        abort.store(true, Ordering::Relaxed);
                        return Err(Error::ExtractionTaskFailure {
                            chunk: index,
                            stride: voxel_stride,
                            message,
                        });
                    }
                }
            }
            Ok(())
        });
        outcome?;

        let active_cells = merger.active_cells;
        let mesh = merger.finish();
        let elapsed = start.elapsed();
        log::info!(
            "Stride {} meshed: {} chunks, {} vertices, {} triangles in {:?}",
            stride,
            chunks.len(),
            mesh.vertex_count(),
            mesh.face_count(),
            elapsed
        );

        Ok(ResolutionLevel {
            stride,
            mesh,
            chunk_count: chunks.len(),
            active_cells,
            elapsed,
        })
    }
}

/// Mesh the cells owned by one chunk, positioned in parent lattice coordinates
fn mesh_chunk<F: Field + ?Sized>(
    field: &F,
    field_bounds: &Bounds,
    chunk: &Chunk,
    voxel_stride: Index3,
    engine: &MarchingCubes,
    sampling: SamplingStrategy,
) -> Result<CellMesh> {
    let owned = chunk.owned_cells(field_bounds, voxel_stride, engine.config().scan_halo);
    let local = owned.translated(chunk.offset.map(|o| -o));
    let lattice = LatticeView::new(field, voxel_stride, chunk.offset);

    let part = if sampling == SamplingStrategy::Direct || local.is_degenerate() {
        engine.march(&lattice, local, chunk.offset)
    } else {
        let samples = Bounds::new(local.min, local.max.map(|m| m + 1));
        let copy = ArrayField::copy_from(&lattice, samples)?;
        engine.march(&copy, local, chunk.offset)
    };

    log::debug!(
        "Chunk {} at stride {:?}: {} cells, {} active, {} vertices, {} triangles",
        chunk.index,
        voxel_stride,
        local.sample_count(),
        part.active_cells,
        part.mesh.vertex_count(),
        part.mesh.face_count()
    );
    Ok(part)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "extraction task panicked".to_string()
    }
}

/// Running aggregate of one stride's chunk meshes
struct LevelMerger {
    sharing: VertexSharing,
    compute_normals: bool,
    mesh: TriangleMesh,
    welded: HashMap<EdgeId, usize>,
    active_cells: usize,
}

impl LevelMerger {
    fn new(sharing: VertexSharing, compute_normals: bool) -> Self {
        let mut mesh = TriangleMesh::new();
        if compute_normals && sharing == VertexSharing::PerChunk {
            mesh.normals = Some(Vec::new());
        }
        Self {
            sharing,
            compute_normals,
            mesh,
            welded: HashMap::new(),
            active_cells: 0,
        }
    }

    fn push(&mut self, part: CellMesh) {
        self.active_cells += part.active_cells;
        match self.sharing {
            VertexSharing::PerChunk => self.mesh.append(part.mesh),
            VertexSharing::GlobalId => {
                let CellMesh { mesh, edge_ids, .. } = part;
                let remap: Vec<usize> = edge_ids
                    .iter()
                    .zip(mesh.vertices)
                    .map(|(id, position)| {
                        *self
                            .welded
                            .entry(*id)
                            .or_insert_with(|| self.mesh.add_vertex(position))
                    })
                    .collect();
                for [a, b, c] in mesh.faces {
                    self.mesh.add_face([remap[a], remap[b], remap[c]]);
                }
            }
        }
    }

    fn finish(mut self) -> TriangleMesh {
        if self.sharing == VertexSharing::GlobalId && self.compute_normals {
            self.mesh.compute_vertex_normals();
        }
        self.mesh
    }
}

/// Run multi-resolution extraction with a default thread pool
pub fn extract_all<F: Field + ?Sized>(
    field: &F,
    config: &ExtractionConfig,
) -> Result<Vec<ResolutionLevel>> {
    ExtractionScheduler::new(config.clone(), &ThreadPoolConfig::default())?.extract_all(field)
}

/// Like [`extract_all`], delivering each level to `on_level` as it finishes
pub fn extract_all_with<F, C>(field: &F, config: &ExtractionConfig, on_level: C) -> Result<()>
where
    F: Field + ?Sized,
    C: FnMut(ResolutionLevel),
{
    ExtractionScheduler::new(config.clone(), &ThreadPoolConfig::default())?
        .extract_all_with(field, on_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marching_cubes::Criterion;
    use labelmesh_core::{FunctionField, Point3f};

    fn ball(radius: i64) -> FunctionField<impl Fn(Index3) -> f64 + Sync> {
        let size = 2 * radius + 6;
        let center = size / 2;
        let bounds = Bounds::new([0, 0, 0], [size - 1, size - 1, size - 1]);
        FunctionField::new(bounds, 0.0, move |[x, y, z]| {
            let (dx, dy, dz) = (x - center, y - center, z - center);
            if dx * dx + dy * dy + dz * dz <= radius * radius {
                5.0
            } else {
                0.0
            }
        })
    }

    fn scheduler(config: ExtractionConfig, threads: usize) -> ExtractionScheduler {
        let pool = ThreadPoolConfig::default().with_threads(threads);
        ExtractionScheduler::new(config, &pool).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected_before_running() {
        let result = ExtractionScheduler::new(
            ExtractionConfig::default().with_voxel_strides(vec![]),
            &ThreadPoolConfig::default(),
        );
        assert!(matches!(result, Err(Error::InvalidExtractionConfig(_))));
    }

    #[test]
    fn test_levels_arrive_coarsest_first() {
        let field = ball(6);
        let config = ExtractionConfig::default()
            .with_iso_level(5.0)
            .with_chunk_size([4, 4, 4])
            .with_voxel_strides(vec![1, 4, 2]);

        let mut strides = Vec::new();
        scheduler(config, 2)
            .extract_all_with(&field, |level| strides.push(level.stride))
            .unwrap();
        assert_eq!(strides, vec![4, 2, 1]);
    }

    #[test]
    fn test_per_chunk_merge_keeps_indices_valid() {
        let field = ball(6);
        let config = ExtractionConfig::default()
            .with_iso_level(5.0)
            .with_chunk_size([3, 3, 3])
            .with_voxel_strides(vec![1]);

        let levels = scheduler(config, 3).extract_all(&field).unwrap();
        let level = &levels[0];
        assert!(level.chunk_count > 1);
        assert!(!level.mesh.is_empty());
        assert_eq!(level.mesh.normals.as_ref().map(Vec::len), Some(level.mesh.vertex_count()));
        for face in &level.mesh.faces {
            assert!(face.iter().all(|&i| i < level.mesh.vertex_count()));
            assert!(face[0] != face[1] && face[1] != face[2] && face[0] != face[2]);
        }
    }

    #[test]
    fn test_empty_volume_yields_empty_levels() {
        let field = FunctionField::new(Bounds::new([0, 0, 0], [15, 15, 15]), 0.0, |_| 0.0);
        let config = ExtractionConfig::default().with_voxel_strides(vec![4, 1]);
        let levels = extract_all(&field, &config).unwrap();
        assert_eq!(levels.len(), 2);
        assert!(levels.iter().all(|level| level.mesh.vertex_count() == 0));
        assert!(levels.iter().all(|level| level.active_cells == 0));
    }

    #[test]
    fn test_huge_chunk_size_meshes_as_one_chunk() {
        let field = ball(3);
        let config = ExtractionConfig::default()
            .with_iso_level(5.0)
            .with_chunk_size([i64::MAX / 4, 8, i64::MAX])
            .with_voxel_strides(vec![4, 1]);
        assert!(config.validate().is_ok());

        let levels = scheduler(config, 2).extract_all(&field).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].chunk_count, 1);
        // 12 voxels along y in chunks of 8 cells at stride 1
        assert_eq!(levels[1].chunk_count, 2);

        let whole = crate::marching_cubes::extract(
            &field,
            field.bounds(),
            [1, 1, 1],
            5.0,
            Criterion::Exact,
        );
        assert_eq!(levels[1].mesh.face_count(), whole.face_count());
        assert!(!whole.is_empty());
    }

    #[test]
    fn test_volume_space_mesh_scales_by_stride() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(1.0, 0.5, 0.0),
                Point3f::new(2.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let level = ResolutionLevel {
            stride: 4,
            mesh,
            chunk_count: 1,
            active_cells: 1,
            elapsed: Duration::ZERO,
        };
        let scaled = level.volume_space_mesh();
        assert_eq!(scaled.vertices[0], Point3f::new(4.0, 2.0, 0.0));
        assert_eq!(scaled.faces, level.mesh.faces);
        assert_eq!(level.voxel_stride(), [4, 4, 4]);
    }

    #[test]
    fn test_panicking_task_reports_chunk_failure() {
        let field = FunctionField::new(Bounds::new([0, 0, 0], [15, 15, 15]), 0.0, |[x, y, z]| {
            if [x, y, z] == [12, 12, 12] {
                panic!("sample {:?} unavailable", [x, y, z]);
            }
            0.0
        });
        let config = ExtractionConfig::default()
            .with_chunk_size([4, 4, 4])
            .with_voxel_strides(vec![1]);

        match scheduler(config, 2).extract_all(&field) {
            Err(Error::ExtractionTaskFailure { stride, message, .. }) => {
                assert_eq!(stride, [1, 1, 1]);
                assert!(message.contains("unavailable"));
            }
            other => panic!("expected a task failure, got {:?}", other.map(|l| l.len())),
        }
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "extraction task panicked");
    }
}
