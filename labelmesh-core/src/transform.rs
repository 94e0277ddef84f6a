//! 3D transformation utilities

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// An affine 3D transformation applied to mesh vertices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create a scaling transformation
    pub fn scaling(scale: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&scale),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Transform a surface normal (inverse transpose of the linear part)
    ///
    /// The result is renormalized; zero normals stay zero, and a singular
    /// linear part leaves the normal unchanged.
    pub fn transform_normal(&self, normal: &Vector3<f32>) -> Vector3<f32> {
        let linear: Matrix3<f32> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let Some(inverse) = linear.try_inverse() else {
            return *normal;
        };
        let transformed = inverse.transpose() * normal;
        let length = transformed.norm();
        if length > 0.0 {
            transformed / length
        } else {
            transformed
        }
    }
}
