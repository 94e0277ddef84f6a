//! Core data structures and traits for labelmesh
//!
//! This crate provides the data model shared by the extraction engine and its
//! collaborators: integer index bounds, the read-only [`Field`] accessor over
//! 3D scalar/label volumes, triangle meshes, and essential traits.

pub mod bounds;
pub mod error;
pub mod field;
pub mod mesh;
pub mod point;
pub mod traits;
pub mod transform;

pub use bounds::*;
pub use error::*;
pub use field::*;
pub use mesh::*;
pub use point::*;
pub use traits::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
