//! Mesh generation for voxel rendering.
//!
//! This module handles the conversion of chunk block data into vertex and index
//! streams. The key goals are:
//! 1. Emit nothing for faces hidden by an opaque neighbour
//! 2. Keep water in its own stream so it can be drawn after the opaque pass
//! 3. Produce world-space vertices so chunks need no per-draw transform
//!
//! # Performance Considerations
//! - Fully enclosed blocks are rejected with six bit tests before any face work
//! - Opacity lookups go through the chunk's packed opacity mask

/// Core mesh generation algorithms and data structures.
pub mod mesh;

pub use mesh::{build_chunk_mesh, ChunkMesh, Face, MeshStream};
