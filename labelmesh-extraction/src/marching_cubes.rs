//! Marching Cubes isosurface extraction
//!
//! This module provides table-driven isosurface extraction from scalar and
//! label fields. One call scans a block of cells, shares one vertex per
//! crossed lattice edge, and returns a fresh [`TriangleMesh`]; nothing is
//! kept between calls.

use crate::sampler::{corner_indices, div_ceil, div_floor, CellSampler, LatticeView};
use crate::tables::{EDGE_AXIS, EDGE_CORNERS, EDGE_TABLE, TRIANGLE_SENTINEL, TRIANGLE_TABLE};
use itertools::iproduct;
use labelmesh_core::{index_to_point, Bounds, Field, Index3, Point3f, TriangleMesh};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rule deciding whether a sampled value is inside the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    /// Inside iff the value equals the iso level (one label of a label volume)
    Exact,
    /// Inside iff the value is at least the iso level (scalar threshold)
    GreaterOrEqual,
}

impl Criterion {
    #[inline]
    pub fn is_inside(self, value: f64, iso_level: f64) -> bool {
        match self {
            Criterion::Exact => value == iso_level,
            Criterion::GreaterOrEqual => value >= iso_level,
        }
    }

    /// Interpolation parameter of the crossing between two edge corners
    ///
    /// Label volumes carry no distance information, so `Exact` crossings are
    /// interpolated on the inside/outside indicator and land on edge midpoints.
    fn crossing(self, v0: f64, v1: f64, iso_level: f64) -> f64 {
        let (v0, v1, level) = match self {
            Criterion::Exact => (
                indicator(self.is_inside(v0, iso_level)),
                indicator(self.is_inside(v1, iso_level)),
                0.5,
            ),
            Criterion::GreaterOrEqual => (v0, v1, iso_level),
        };
        if v0 == v1 {
            0.0
        } else {
            ((level - v0) / (v1 - v0)).clamp(0.0, 1.0)
        }
    }
}

fn indicator(inside: bool) -> f64 {
    if inside {
        1.0
    } else {
        0.0
    }
}

/// Stable key of one lattice edge: its lower corner and its axis
///
/// Adjacent cells that touch the same physical edge compute the same id.
/// Coordinates are packed into 42 bits each, so lattice corners must lie in
/// [`EdgeId::COORD_RANGE`] (±2^41 per axis); fields larger than that are
/// not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u128);

const COORD_BITS: u32 = 42;
const COORD_MASK: u128 = (1 << COORD_BITS) - 1;
const COORD_BIAS: i64 = 1 << (COORD_BITS - 1);

impl EdgeId {
    /// Smallest and largest corner coordinate an id can hold
    pub const COORD_RANGE: (i64, i64) = (-COORD_BIAS, COORD_BIAS - 1);

    pub fn new(corner: Index3, axis: usize) -> Self {
        debug_assert!(axis < 3);
        debug_assert!(
            corner
                .iter()
                .all(|&c| (Self::COORD_RANGE.0..=Self::COORD_RANGE.1).contains(&c)),
            "lattice corner {:?} exceeds the edge id range",
            corner
        );
        let pack = |c: i64| ((c + COORD_BIAS) as u128) & COORD_MASK;
        Self(
            (pack(corner[0]) << (2 * COORD_BITS + 2))
                | (pack(corner[1]) << (COORD_BITS + 2))
                | (pack(corner[2]) << 2)
                | axis as u128,
        )
    }

    /// Lower corner of the edge in global lattice coordinates
    pub fn corner(self) -> Index3 {
        let unpack = |bits: u128| (bits & COORD_MASK) as i64 - COORD_BIAS;
        [
            unpack(self.0 >> (2 * COORD_BITS + 2)),
            unpack(self.0 >> (COORD_BITS + 2)),
            unpack(self.0 >> 2),
        ]
    }

    pub fn axis(self) -> usize {
        (self.0 & 0b11) as usize
    }

    pub fn raw(self) -> u128 {
        self.0
    }
}

/// Edge id to vertex mapping built while scanning cells
///
/// Vertices are numbered contiguously from zero in first-seen order. An id is
/// interpolated once; later cells reuse the stored index.
#[derive(Debug, Default)]
pub struct VertexTable {
    indices: HashMap<EdgeId, usize>,
    positions: Vec<Point3f>,
    edge_ids: Vec<EdgeId>,
}

impl VertexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the vertex for `id`, computing its position on first use
    pub fn intern(&mut self, id: EdgeId, position: impl FnOnce() -> Point3f) -> usize {
        if let Some(&index) = self.indices.get(&id) {
            return index;
        }
        let index = self.positions.len();
        self.positions.push(position());
        self.edge_ids.push(id);
        self.indices.insert(id, index);
        index
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex positions and the edge id of each vertex, index-aligned
    pub fn into_parts(self) -> (Vec<Point3f>, Vec<EdgeId>) {
        (self.positions, self.edge_ids)
    }
}

/// Configuration for Marching Cubes algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct MarchingCubesConfig {
    /// Isosurface level (scalar value or label id to extract)
    pub iso_level: f64,
    /// How corner values are classified against `iso_level`
    pub criterion: Criterion,
    /// Whether to compute vertex normals
    pub compute_normals: bool,
    /// Scan one extra cell beyond the range on every side
    pub scan_halo: bool,
}

impl Default for MarchingCubesConfig {
    fn default() -> Self {
        Self {
            iso_level: 1.0,
            criterion: Criterion::Exact,
            compute_normals: true,
            scan_halo: true,
        }
    }
}

/// Output of one scan over a block of cells
#[derive(Debug, Clone, Default)]
pub struct CellMesh {
    /// Triangles and vertices in global lattice coordinates
    pub mesh: TriangleMesh,
    /// Edge id of every vertex, aligned with `mesh.vertices`
    pub edge_ids: Vec<EdgeId>,
    /// Number of cells that produced at least one crossing
    pub active_cells: usize,
}

/// Marching Cubes implementation
#[derive(Debug, Clone)]
pub struct MarchingCubes {
    config: MarchingCubesConfig,
}

impl MarchingCubes {
    /// Create a new Marching Cubes instance
    pub fn new(config: MarchingCubesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarchingCubesConfig {
        &self.config
    }

    /// Extract the isosurface of `field` over `cell_range` at `voxel_stride`
    ///
    /// Corners are sampled at multiples of the stride, and positions are
    /// returned in stride-lattice units (field index divided by stride). A
    /// degenerate range or a stride below 1 yields an empty mesh.
    pub fn extract<F: Field + ?Sized>(
        &self,
        field: &F,
        cell_range: Bounds,
        voxel_stride: Index3,
    ) -> TriangleMesh {
        if cell_range.is_degenerate() || voxel_stride.iter().any(|&s| s < 1) {
            log::warn!(
                "Degenerate extraction input (range {:?}, stride {:?}); returning an empty mesh",
                cell_range,
                voxel_stride
            );
            return self.empty_mesh();
        }

        let cells = lattice_cells(&cell_range, voxel_stride, self.config.scan_halo);
        let lattice = LatticeView::new(field, voxel_stride, [0, 0, 0]);
        self.march(&lattice, cells, [0, 0, 0]).mesh
    }

    /// Scan the inclusive block `cells` of a unit lattice
    ///
    /// Cell `c` spans lattice samples `c..=c + 1`. Output positions and edge
    /// ids are shifted by `origin`, so a block marched on a chunk-local
    /// lattice lands in the parent volume's lattice coordinates.
    pub fn march<F: Field + ?Sized>(&self, lattice: &F, cells: Bounds, origin: Index3) -> CellMesh {
        if cells.is_degenerate() {
            return CellMesh {
                mesh: self.empty_mesh(),
                ..CellMesh::default()
            };
        }

        let sampler = CellSampler::new(lattice);
        let iso_level = self.config.iso_level;
        let criterion = self.config.criterion;

        let mut vertices = VertexTable::new();
        let mut faces = Vec::new();
        let mut active_cells = 0;

        for (z, y, x) in iproduct!(
            cells.min[2]..=cells.max[2],
            cells.min[1]..=cells.max[1],
            cells.min[0]..=cells.max[0]
        ) {
            let values = sampler.sample([x, y, z]);

            let mut cube_index = 0usize;
            for (corner, &value) in values.iter().enumerate() {
                if criterion.is_inside(value, iso_level) {
                    cube_index |= 1 << corner;
                }
            }

            let edge_mask = EDGE_TABLE[cube_index];
            if edge_mask == 0 {
                continue;
            }
            active_cells += 1;

            let corners = corner_indices([x + origin[0], y + origin[1], z + origin[2]]);
            let mut edge_vertices = [None; 12];

            for edge in 0..12 {
                if edge_mask & (1 << edge) == 0 {
                    continue;
                }
                let [low, high] = EDGE_CORNERS[edge];
                let axis = EDGE_AXIS[edge];
                let corner = corners[low];
                let id = EdgeId::new(corner, axis);

                edge_vertices[edge] = Some(vertices.intern(id, || {
                    let t = criterion.crossing(values[low], values[high], iso_level);
                    let mut position = index_to_point(corner);
                    position[axis] += t as f32;
                    position
                }));
            }

            for triangle in TRIANGLE_TABLE[cube_index].chunks_exact(3) {
                if triangle.contains(&TRIANGLE_SENTINEL) {
                    break;
                }
                let triangle = (
                    edge_vertices[triangle[0] as usize],
                    edge_vertices[triangle[1] as usize],
                    edge_vertices[triangle[2] as usize],
                );
                // The table winds toward the inside; flip so faces point outward
                if let (Some(a), Some(b), Some(c)) = triangle {
                    faces.push([a, c, b]);
                }
            }
        }

        let (positions, edge_ids) = vertices.into_parts();
        let mut mesh = TriangleMesh::from_vertices_and_faces(positions, faces);
        if self.config.compute_normals {
            mesh.compute_vertex_normals();
        }

        CellMesh {
            mesh,
            edge_ids,
            active_cells,
        }
    }

    fn empty_mesh(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        if self.config.compute_normals {
            mesh.normals = Some(Vec::new());
        }
        mesh
    }
}

/// Lattice cells covering an index range at a stride
///
/// With the halo, the block reaches one cell past the range on every side so
/// boundary samples get a complete neighbourhood. Without it, only cells
/// whose 8 corners all fall inside the range are kept.
pub fn lattice_cells(range: &Bounds, voxel_stride: Index3, halo: bool) -> Bounds {
    let mut cells = Bounds::new([0; 3], [0; 3]);
    for axis in 0..3 {
        let first = div_ceil(range.min[axis], voxel_stride[axis]);
        let last = div_floor(range.max[axis], voxel_stride[axis]);
        if halo {
            cells.min[axis] = first - 1;
            cells.max[axis] = last;
        } else {
            cells.min[axis] = first;
            cells.max[axis] = last - 1;
        }
    }
    cells
}

/// Convenience function: extract one isosurface with default options
pub fn extract<F: Field + ?Sized>(
    field: &F,
    cell_range: Bounds,
    voxel_stride: Index3,
    iso_level: f64,
    criterion: Criterion,
) -> TriangleMesh {
    let config = MarchingCubesConfig {
        iso_level,
        criterion,
        ..Default::default()
    };
    MarchingCubes::new(config).extract(field, cell_range, voxel_stride)
}
