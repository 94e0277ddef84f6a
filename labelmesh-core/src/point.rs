//! Point and vector types

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Integer index coordinate inside a field or lattice, ordered `[x, y, z]`
pub type Index3 = [i64; 3];

/// Convert an integer lattice coordinate into a point
pub fn index_to_point(index: Index3) -> Point3f {
    Point3f::new(index[0] as f32, index[1] as f32, index[2] as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_to_point() {
        assert_eq!(index_to_point([1, -2, 3]), Point3f::new(1.0, -2.0, 3.0));
    }
}
