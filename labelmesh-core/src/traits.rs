//! Core traits for labelmesh

use crate::{mesh::*, point::*, transform::Transform3D};

/// Trait for objects with spatial extent
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);
}

/// Trait for objects that can be transformed
pub trait Transformable {
    /// Apply a transformation to the object
    fn transform(&mut self, transform: &Transform3D);
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        if self.vertices.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }
}

impl Transformable for TriangleMesh {
    fn transform(&mut self, transform: &Transform3D) {
        for vertex in &mut self.vertices {
            *vertex = transform.transform_point(vertex);
        }
        if let Some(normals) = &mut self.normals {
            for normal in normals {
                *normal = transform.transform_normal(normal);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_mesh_bounding_box() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(-1.0, 0.0, 2.0),
                Point3f::new(3.0, -2.0, 0.5),
                Point3f::new(0.0, 4.0, 1.0),
            ],
            vec![[0, 1, 2]],
        );
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.5));
        assert_eq!(max, Point3f::new(3.0, 4.0, 2.0));
    }

    #[test]
    fn test_empty_mesh_bounding_box() {
        let mesh = TriangleMesh::new();
        assert_eq!(mesh.bounding_box(), (Point3f::origin(), Point3f::origin()));
    }

    #[test]
    fn test_transform_mesh_scales_vertices() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(1.0, 1.0, 1.0),
                Point3f::new(2.0, 1.0, 1.0),
                Point3f::new(1.0, 2.0, 1.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.compute_vertex_normals();
        mesh.transform(&Transform3D::scaling(Vector3::new(2.0, 2.0, 2.0)));

        assert_eq!(mesh.vertices[1], Point3f::new(4.0, 2.0, 2.0));
        let normal = mesh.normals.unwrap()[0];
        assert!((normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }
}
