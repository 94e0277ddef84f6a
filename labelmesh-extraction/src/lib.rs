//! # labelmesh extraction
//!
//! Chunked, parallel, multi-resolution Marching Cubes for 3D label volumes.
//!
//! A single [`extract`] call meshes one block of cells. The [`partition`]
//! functions split a volume into chunks, and [`ExtractionScheduler`] runs one
//! extraction per chunk on a rayon pool for every configured voxel stride,
//! merging the chunk meshes as they complete.

pub mod config;
pub mod marching_cubes;
pub mod parallel;
pub mod partition;
pub mod sampler;
pub mod scheduler;
pub mod tables;

// Re-export commonly used items
pub use config::*;
pub use marching_cubes::*;
pub use parallel::*;
pub use partition::*;
pub use sampler::{CellSampler, LatticeView};
pub use scheduler::*;
