//! Mesh data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices, faces and optional per-vertex normals
///
/// Faces wind counter-clockwise when seen from outside the surface, so
/// `(v1 - v0) x (v2 - v0)` points away from the enclosed region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Unnormalized face normals, one per face
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1.cross(&edge2)
            })
            .collect()
    }

    /// Recompute per-vertex normals from the faces
    ///
    /// Each face adds its unnormalized normal to its three vertices, so larger
    /// faces weigh more. Accumulators are normalized at the end; vertices whose
    /// sum has zero length keep the zero vector.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];

        for (face, face_normal) in self.faces.iter().zip(self.calculate_face_normals()) {
            for &vertex in face {
                normals[vertex] += face_normal;
            }
        }

        for normal in &mut normals {
            let length = normal.norm();
            if length > 0.0 {
                *normal /= length;
            }
        }

        self.normals = Some(normals);
    }

    /// Append another mesh, offsetting its face indices by the current vertex count
    ///
    /// Vertices are not deduplicated. Normals survive only when both meshes
    /// carry them.
    pub fn append(&mut self, other: TriangleMesh) {
        let offset = self.vertices.len();
        let had_geometry = !self.vertices.is_empty();

        self.normals = match (self.normals.take(), other.normals) {
            (Some(mut ours), Some(theirs)) => {
                ours.extend(theirs);
                Some(ours)
            }
            (None, Some(theirs)) if !had_geometry => Some(theirs),
            _ => None,
        };

        self.vertices.extend(other.vertices);
        self.faces.extend(
            other
                .faces
                .into_iter()
                .map(|[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_face_normals_follow_winding() {
        let mesh = unit_triangle();
        let normals = mesh.calculate_face_normals();
        assert_eq!(normals.len(), 1);
        assert_relative_eq!(normals[0], Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_vertex_normals_are_normalized() {
        let mut mesh = unit_triangle();
        // Second triangle scaled up, same orientation
        let a = mesh.add_vertex(Point3f::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3f::new(3.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3f::new(0.0, 3.0, 0.0));
        mesh.add_face([a, b, c]);

        mesh.compute_vertex_normals();
        let normals = mesh.normals.as_ref().unwrap();
        assert_eq!(normals.len(), 6);
        for normal in normals {
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-6);
            assert_relative_eq!(normal.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_isolated_vertex_keeps_zero_normal() {
        let mut mesh = unit_triangle();
        mesh.add_vertex(Point3f::new(5.0, 5.0, 5.0));
        mesh.compute_vertex_normals();
        let normals = mesh.normals.unwrap();
        assert_eq!(normals[3], Vector3f::zeros());
    }

    #[test]
    fn test_degenerate_face_contributes_nothing() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(2.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.compute_vertex_normals();
        assert!(mesh.normals.unwrap().iter().all(|n| *n == Vector3f::zeros()));
    }

    #[test]
    fn test_append_offsets_indices() {
        let mut mesh = unit_triangle();
        let mut other = unit_triangle();
        other.vertices[0].z = 1.0;

        mesh.append(other);

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(mesh.vertices[3], Point3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_append_keeps_normals_only_when_both_have_them() {
        let mut with_normals = unit_triangle();
        with_normals.compute_vertex_normals();

        let mut aggregate = TriangleMesh::new();
        aggregate.append(with_normals.clone());
        assert_eq!(aggregate.normals.as_ref().map(Vec::len), Some(3));

        aggregate.append(with_normals.clone());
        assert_eq!(aggregate.normals.as_ref().map(Vec::len), Some(6));

        aggregate.append(unit_triangle());
        assert!(aggregate.normals.is_none());
    }

    #[test]
    fn test_empty_mesh() {
        assert!(!unit_triangle().is_empty());
        assert!(TriangleMesh::new().is_empty());
        assert_eq!(TriangleMesh::new(), TriangleMesh::default());

        let vertices_only = TriangleMesh::from_vertices_and_faces(unit_triangle().vertices, vec![]);
        assert!(vertices_only.is_empty());
    }
}
