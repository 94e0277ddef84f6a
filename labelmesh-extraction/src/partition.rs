//! Volume partitioning
//!
//! Splits a field's index range into a grid of chunks, one per parallel task.
//! Chunk cores tile the volume exactly; each chunk's bounds additionally
//! reach one voxel below its core on every axis where the field allows it.

use crate::sampler::{div_ceil, div_floor};
use labelmesh_core::{Bounds, Error, Field, Index3, Result};
use serde::{Deserialize, Serialize};

/// One axis-aligned sub-volume of a partitioned field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the x-fastest chunk order
    pub index: usize,
    /// Grid coordinate of the chunk
    pub grid: Index3,
    /// Number of chunks along each axis
    pub grid_dims: Index3,
    /// Core grown by the one-voxel lower overlap
    pub bounds: Bounds,
    /// Non-overlapping region; cores of all chunks tile the field
    pub core: Bounds,
    /// Lower bound of `bounds` in stride-lattice units
    pub offset: Index3,
}

impl Chunk {
    pub fn is_first(&self, axis: usize) -> bool {
        self.grid[axis] == 0
    }

    pub fn is_last(&self, axis: usize) -> bool {
        self.grid[axis] == self.grid_dims[axis] - 1
    }

    /// Stride-lattice cells this chunk is responsible for
    ///
    /// A cell belongs to the chunk whose core holds its upper corner. With
    /// the halo, the last chunk along an axis also takes the cell reaching
    /// past the field maximum; without it, cells reaching below the field
    /// minimum are dropped. Across all chunks of one partition the result
    /// covers every cell of [`lattice_cells`](crate::lattice_cells) for the
    /// whole field exactly once. The returned range may be degenerate.
    pub fn owned_cells(&self, field_bounds: &Bounds, stride: Index3, halo: bool) -> Bounds {
        let mut cells = Bounds::new([0; 3], [0; 3]);
        for axis in 0..3 {
            let s = stride[axis];
            let mut lo = div_ceil(self.core.min[axis], s) - 1;
            let mut hi = div_floor(self.core.max[axis], s) - 1;
            if halo {
                if self.is_last(axis) {
                    hi += 1;
                }
            } else {
                lo = lo.max(div_ceil(field_bounds.min[axis], s));
            }
            cells.min[axis] = lo;
            cells.max[axis] = hi;
        }
        cells
    }
}

/// Partition `field` into chunks of `chunk_size` voxels per axis
pub fn partition<F: Field + ?Sized>(field: &F, chunk_size: Index3) -> Result<Vec<Chunk>> {
    partition_with_stride(field, chunk_size, [1, 1, 1])
}

/// Partition `field`, recording chunk offsets for the given voxel stride
///
/// The final chunk along an axis is clamped to the field maximum and may be
/// smaller than `chunk_size`.
pub fn partition_with_stride<F: Field + ?Sized>(
    field: &F,
    chunk_size: Index3,
    voxel_stride: Index3,
) -> Result<Vec<Chunk>> {
    let field_bounds = field.bounds();

    if let Some(axis) = (0..3).find(|&axis| chunk_size[axis] <= 0) {
        return Err(Error::InvalidPartitionConfig(format!(
            "chunk size must be positive, got {} on axis {}",
            chunk_size[axis], axis
        )));
    }
    if let Some(axis) = (0..3).find(|&axis| voxel_stride[axis] < 1) {
        return Err(Error::InvalidPartitionConfig(format!(
            "voxel stride must be at least 1, got {} on axis {}",
            voxel_stride[axis], axis
        )));
    }
    if field_bounds.is_degenerate() {
        return Err(Error::InvalidPartitionConfig(format!(
            "field bounds {:?} have no extent",
            field_bounds
        )));
    }

    // Chunk sizes beyond the field extent yield a single chunk
    let grid_dims: Index3 =
        [0, 1, 2].map(|axis| (field_bounds.extent(axis) - 1) / chunk_size[axis] + 1);

    let count = grid_dims.iter().product::<i64>() as usize;
    let mut chunks = Vec::with_capacity(count);

    let grid_range = Bounds::new([0, 0, 0], grid_dims.map(|dim| dim - 1));
    for grid in grid_range.indices() {
        let mut core = Bounds::new([0; 3], [0; 3]);
        let mut bounds = Bounds::new([0; 3], [0; 3]);
        let mut offset = [0; 3];

        for axis in 0..3 {
            let start = field_bounds.min[axis] + grid[axis] * chunk_size[axis];
            core.min[axis] = start;
            core.max[axis] = start
                .saturating_add(chunk_size[axis] - 1)
                .min(field_bounds.max[axis]);
            bounds.min[axis] = (start - 1).max(field_bounds.min[axis]);
            bounds.max[axis] = core.max[axis];
            offset[axis] = div_floor(bounds.min[axis], voxel_stride[axis]);
        }

        chunks.push(Chunk {
            index: chunks.len(),
            grid,
            grid_dims,
            bounds,
            core,
            offset,
        });
    }

    Ok(chunks)
}
