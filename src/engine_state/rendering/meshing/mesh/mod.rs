//! Mesh generation and manipulation for voxel rendering.
//!
//! This module provides the core functionality for converting voxel data into
//! GPU-friendly mesh representations.
//!
//! # Architecture
//! - [`ChunkMesh`]: the opaque and water [`MeshStream`]s of one chunk
//! - [`Face`]: a single quad built from a unit-cube template
//! - [`build_chunk_mesh`]: per-voxel face culling over a whole chunk
//!
//! # Usage
//! ```
//! use cgmath::Point3;
//! use octacubic::engine_state::rendering::meshing::build_chunk_mesh;
//! use octacubic::engine_state::voxels::{block::BlockType, chunk::Chunk, coords::ChunkCoord};
//!
//! let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
//! chunk.set_block_id(Point3::new(1, 1, 1), BlockType::STONE).unwrap();
//!
//! let mesh = build_chunk_mesh(&chunk);
//! assert_eq!(mesh.opaque.vertices.len(), 24);
//! ```

mod culling;
mod face;
mod mesh;

pub use culling::build_chunk_mesh;
pub use face::{Face, FACE_TEMPLATES, QUAD_INDICES};
pub use mesh::*;
