//! Extraction parameters shared by every chunk task

use crate::marching_cubes::{Criterion, MarchingCubesConfig};
use labelmesh_core::{Error, Index3, Result};
use serde::{Deserialize, Serialize};

/// How chunk meshes are combined into one level mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexSharing {
    /// Concatenate chunk meshes; vertices on chunk seams are duplicated
    PerChunk,
    /// Weld vertices across chunks by global edge id
    GlobalId,
}

/// How a task reads the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingStrategy {
    /// Read the shared field in place
    Direct,
    /// Copy the chunk's lattice samples into a dense array first
    ArrayCopy,
}

/// Configuration for multi-resolution chunked extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Isosurface level (label id for `Criterion::Exact`)
    pub iso_level: f64,
    pub criterion: Criterion,
    /// Chunk size in cells of the current stride
    pub chunk_size: Index3,
    /// Uniform voxel strides to mesh, run coarsest first
    pub voxel_strides: Vec<i64>,
    pub vertex_sharing: VertexSharing,
    pub sampling: SamplingStrategy,
    /// Whether to compute vertex normals
    pub compute_normals: bool,
    /// Scan one cell beyond the field bounds on every side
    pub scan_halo: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            iso_level: 1.0,
            criterion: Criterion::Exact,
            chunk_size: [64, 64, 64],
            voxel_strides: vec![32, 16, 8, 4, 2, 1],
            vertex_sharing: VertexSharing::PerChunk,
            sampling: SamplingStrategy::Direct,
            compute_normals: true,
            scan_halo: true,
        }
    }
}

impl ExtractionConfig {
    pub fn with_iso_level(mut self, iso_level: f64) -> Self {
        self.iso_level = iso_level;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set chunk size in cells per axis
    pub fn with_chunk_size(mut self, chunk_size: Index3) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_voxel_strides(mut self, voxel_strides: Vec<i64>) -> Self {
        self.voxel_strides = voxel_strides;
        self
    }

    pub fn with_vertex_sharing(mut self, vertex_sharing: VertexSharing) -> Self {
        self.vertex_sharing = vertex_sharing;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingStrategy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_normals(mut self, compute_normals: bool) -> Self {
        self.compute_normals = compute_normals;
        self
    }

    pub fn with_halo(mut self, scan_halo: bool) -> Self {
        self.scan_halo = scan_halo;
        self
    }

    /// Check the configuration before any work is scheduled
    pub fn validate(&self) -> Result<()> {
        if !self.iso_level.is_finite() {
            return Err(Error::InvalidExtractionConfig(format!(
                "iso level must be finite, got {}",
                self.iso_level
            )));
        }
        if self.voxel_strides.is_empty() {
            return Err(Error::InvalidExtractionConfig(
                "at least one voxel stride is required".to_string(),
            ));
        }
        if let Some(stride) = self.voxel_strides.iter().find(|&&s| s < 1) {
            return Err(Error::InvalidExtractionConfig(format!(
                "voxel strides must be at least 1, got {}",
                stride
            )));
        }
        if let Some(size) = self.chunk_size.iter().find(|&&c| c < 1) {
            return Err(Error::InvalidExtractionConfig(format!(
                "chunk size must be at least one cell, got {}",
                size
            )));
        }
        Ok(())
    }

    /// Distinct strides from coarsest to finest
    pub fn ordered_strides(&self) -> Vec<i64> {
        let mut strides = self.voxel_strides.clone();
        strides.sort_unstable_by(|a, b| b.cmp(a));
        strides.dedup();
        strides
    }

    /// Per-task engine settings
    ///
    /// Welded levels get their normals after merging, so tasks skip them.
    pub fn engine_config(&self) -> MarchingCubesConfig {
        MarchingCubesConfig {
            iso_level: self.iso_level,
            criterion: self.criterion,
            compute_normals: self.compute_normals
                && self.vertex_sharing == VertexSharing::PerChunk,
            scan_halo: self.scan_halo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtractionConfig::default();
        assert_eq!(config.iso_level, 1.0);
        assert_eq!(config.criterion, Criterion::Exact);
        assert_eq!(config.chunk_size, [64, 64, 64]);
        assert_eq!(config.voxel_strides, vec![32, 16, 8, 4, 2, 1]);
        assert_eq!(config.vertex_sharing, VertexSharing::PerChunk);
        assert_eq!(config.sampling, SamplingStrategy::Direct);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = ExtractionConfig::default()
            .with_iso_level(7.0)
            .with_criterion(Criterion::GreaterOrEqual)
            .with_chunk_size([8, 16, 32])
            .with_voxel_strides(vec![1, 4])
            .with_vertex_sharing(VertexSharing::GlobalId)
            .with_sampling(SamplingStrategy::ArrayCopy)
            .with_normals(false)
            .with_halo(false);

        assert_eq!(config.iso_level, 7.0);
        assert_eq!(config.chunk_size, [8, 16, 32]);
        assert_eq!(config.vertex_sharing, VertexSharing::GlobalId);
        assert!(!config.compute_normals);
        assert!(!config.scan_halo);
    }

    #[test]
    fn test_validation_errors() {
        let invalid = [
            ExtractionConfig::default().with_voxel_strides(vec![]),
            ExtractionConfig::default().with_voxel_strides(vec![4, 0]),
            ExtractionConfig::default().with_chunk_size([8, 0, 8]),
            ExtractionConfig::default().with_iso_level(f64::NAN),
        ];
        for config in invalid {
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidExtractionConfig(_))
            ));
        }
    }

    #[test]
    fn test_strides_run_coarsest_first() {
        let config = ExtractionConfig::default().with_voxel_strides(vec![1, 8, 2, 8, 32]);
        assert_eq!(config.ordered_strides(), vec![32, 8, 2, 1]);
    }

    #[test]
    fn test_engine_config_defers_normals_when_welding() {
        let config = ExtractionConfig::default().with_iso_level(3.0);
        assert!(config.engine_config().compute_normals);
        assert_eq!(config.engine_config().iso_level, 3.0);

        let welded = config.with_vertex_sharing(VertexSharing::GlobalId);
        assert!(!welded.engine_config().compute_normals);
    }
}
