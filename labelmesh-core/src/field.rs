//! Read-only 3D scalar and label fields
//!
//! A [`Field`] is the only view the extraction engine has of a volume: a
//! randomly addressable accessor over an inclusive integer index range. Reads
//! outside the range return the field's background value, so callers never
//! have to bounds-check neighbourhoods at the data boundary.
//!
//! Two interchangeable implementations are provided. [`FunctionField`] wraps
//! any direct-access closure (a memory-mapped store, a procedural volume, a
//! caching loader). [`ArrayField`] owns a dense copy of its samples.

use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::point::Index3;
use ndarray::Array3;
use std::sync::Arc;

/// Sample types a field can store
pub trait Scalar: Copy + Send + Sync + 'static {
    fn to_f64(self) -> f64;
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Read-only accessor over a 3D scalar or label volume
///
/// Implementations must be safe to read from many threads at once.
pub trait Field: Sync {
    /// Inclusive index range holding real samples
    fn bounds(&self) -> Bounds;

    /// Value returned for every read outside [`Field::bounds`]
    fn background(&self) -> f64;

    /// Sample at `index`, or the background value when out of range
    fn value(&self, index: Index3) -> f64;

    fn min(&self, axis: usize) -> i64 {
        self.bounds().min[axis]
    }

    fn max(&self, axis: usize) -> i64 {
        self.bounds().max[axis]
    }
}

impl<F: Field + ?Sized> Field for &F {
    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }

    fn background(&self) -> f64 {
        (**self).background()
    }

    fn value(&self, index: Index3) -> f64 {
        (**self).value(index)
    }
}

impl<F: Field + Send + ?Sized> Field for Arc<F> {
    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }

    fn background(&self) -> f64 {
        (**self).background()
    }

    fn value(&self, index: Index3) -> f64 {
        (**self).value(index)
    }
}

/// Field backed by a direct-access sampling function
pub struct FunctionField<G> {
    bounds: Bounds,
    background: f64,
    sample: G,
}

impl<G> FunctionField<G>
where
    G: Fn(Index3) -> f64 + Sync,
{
    /// The sampling function is only called for indices inside `bounds`
    pub fn new(bounds: Bounds, background: f64, sample: G) -> Self {
        Self {
            bounds,
            background,
            sample,
        }
    }
}

impl<G> Field for FunctionField<G>
where
    G: Fn(Index3) -> f64 + Sync,
{
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn background(&self) -> f64 {
        self.background
    }

    fn value(&self, index: Index3) -> f64 {
        if self.bounds.contains(index) {
            (self.sample)(index)
        } else {
            self.background
        }
    }
}

/// Field holding a dense copy of its samples
#[derive(Debug, Clone)]
pub struct ArrayField<T: Scalar> {
    /// Samples arranged as `[x][y][z]`, relative to `bounds.min`
    data: Array3<T>,
    bounds: Bounds,
    background: T,
}

impl<T: Scalar> ArrayField<T> {
    /// Create a field over `bounds` filled with the background value
    pub fn new(bounds: Bounds, background: T) -> Result<Self> {
        if bounds.is_degenerate() {
            return Err(Error::InvalidData(format!(
                "Cannot allocate an array field over degenerate bounds {:?}",
                bounds
            )));
        }
        let [nx, ny, nz] = bounds.extents();
        let data = Array3::from_elem((nx as usize, ny as usize, nz as usize), background);
        Ok(Self {
            data,
            bounds,
            background,
        })
    }

    /// Wrap an existing `[x][y][z]` array whose first sample sits at `origin`
    pub fn from_array(data: Array3<T>, origin: Index3, background: T) -> Result<Self> {
        let (nx, ny, nz) = data.dim();
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(Error::InvalidData(format!(
                "Array shape {:?} has an empty axis",
                data.dim()
            )));
        }
        let bounds = Bounds::from_min_extent(origin, [nx as i64, ny as i64, nz as i64]);
        Ok(Self {
            data,
            bounds,
            background,
        })
    }

    /// Sample at `index` when inside the bounds
    pub fn get(&self, index: Index3) -> Option<T> {
        self.local(index).map(|local| self.data[local])
    }

    /// Overwrite the sample at `index`
    pub fn set(&mut self, index: Index3, value: T) -> Result<()> {
        match self.local(index) {
            Some(local) => {
                self.data[local] = value;
                Ok(())
            }
            None => Err(Error::InvalidData(format!(
                "Index {:?} out of bounds {:?}",
                index, self.bounds
            ))),
        }
    }

    /// Fill every sample inside `region` (clipped to the field) with `value`
    pub fn fill_region(&mut self, region: &Bounds, value: T) {
        let clipped = region.intersection(&self.bounds);
        if clipped.is_degenerate() {
            return;
        }
        for index in clipped.indices() {
            if let Some(local) = self.local(index) {
                self.data[local] = value;
            }
        }
    }

    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    fn local(&self, index: Index3) -> Option<[usize; 3]> {
        if !self.bounds.contains(index) {
            return None;
        }
        Some([
            (index[0] - self.bounds.min[0]) as usize,
            (index[1] - self.bounds.min[1]) as usize,
            (index[2] - self.bounds.min[2]) as usize,
        ])
    }
}

impl ArrayField<f64> {
    /// Copy `region` of another field into a dense array
    ///
    /// Parts of `region` outside the source read as the source background,
    /// which also becomes the background of the copy.
    pub fn copy_from<F: Field + ?Sized>(source: &F, region: Bounds) -> Result<Self> {
        let mut copy = Self::new(region, source.background())?;
        let [ox, oy, oz] = region.min;
        for ((x, y, z), sample) in copy.data.indexed_iter_mut() {
            *sample = source.value([ox + x as i64, oy + y as i64, oz + z as i64]);
        }
        Ok(copy)
    }
}

impl<T: Scalar> Field for ArrayField<T> {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn background(&self) -> f64 {
        self.background.to_f64()
    }

    fn value(&self, index: Index3) -> f64 {
        match self.local(index) {
            Some(local) => self.data[local].to_f64(),
            None => self.background.to_f64(),
        }
    }
}
