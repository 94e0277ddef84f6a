//! Cell sampling and stride lattices
//!
//! The engine always marches over a unit lattice. Coarser resolutions are
//! expressed by [`LatticeView`], which exposes every `stride`-th sample of a
//! field as a field of its own, so multi-resolution meshing never resamples
//! or copies the source volume.

use crate::tables::CORNER_OFFSETS;
use labelmesh_core::{Bounds, Field, Index3};

/// Floor division for a positive divisor
pub fn div_floor(value: i64, divisor: i64) -> i64 {
    value.div_euclid(divisor)
}

/// Ceiling division for a positive divisor
pub fn div_ceil(value: i64, divisor: i64) -> i64 {
    -(-value).div_euclid(divisor)
}

/// Index positions of the 8 corners of `cell`, in table order
pub fn corner_indices(cell: Index3) -> [Index3; 8] {
    CORNER_OFFSETS.map(|offset| [cell[0] + offset[0], cell[1] + offset[1], cell[2] + offset[2]])
}

/// Reads the 8 corner values of a cell in the order the lookup tables expect
pub struct CellSampler<'a, F: ?Sized> {
    field: &'a F,
}

impl<'a, F: Field + ?Sized> CellSampler<'a, F> {
    pub fn new(field: &'a F) -> Self {
        Self { field }
    }

    pub fn sample(&self, cell: Index3) -> [f64; 8] {
        corner_indices(cell).map(|corner| self.field.value(corner))
    }
}

/// Every `stride`-th sample of a field, re-indexed as a unit lattice
///
/// Lattice index `l` reads field index `(l + origin) * stride`. The origin is
/// given in lattice units and lets a chunk address its samples from zero.
pub struct LatticeView<'a, F: ?Sized> {
    field: &'a F,
    stride: Index3,
    origin: Index3,
}

impl<'a, F: Field + ?Sized> LatticeView<'a, F> {
    /// `stride` must be at least 1 on every axis
    pub fn new(field: &'a F, stride: Index3, origin: Index3) -> Self {
        debug_assert!(stride.iter().all(|&s| s >= 1), "stride must be positive");
        Self {
            field,
            stride,
            origin,
        }
    }

    pub fn stride(&self) -> Index3 {
        self.stride
    }

    pub fn origin(&self) -> Index3 {
        self.origin
    }

    fn to_field_index(&self, lattice: Index3) -> Index3 {
        [
            (lattice[0] + self.origin[0]) * self.stride[0],
            (lattice[1] + self.origin[1]) * self.stride[1],
            (lattice[2] + self.origin[2]) * self.stride[2],
        ]
    }
}

impl<'a, F: Field + ?Sized> Field for LatticeView<'a, F> {
    /// Lattice indices whose field sample lies inside the source bounds
    fn bounds(&self) -> Bounds {
        let source = self.field.bounds();
        let mut bounds = Bounds::new([0; 3], [0; 3]);
        for axis in 0..3 {
            bounds.min[axis] = div_ceil(source.min[axis], self.stride[axis]) - self.origin[axis];
            bounds.max[axis] = div_floor(source.max[axis], self.stride[axis]) - self.origin[axis];
        }
        bounds
    }

    fn background(&self) -> f64 {
        self.field.background()
    }

    fn value(&self, index: Index3) -> f64 {
        self.field.value(self.to_field_index(index))
    }
}
