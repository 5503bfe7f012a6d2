//! # Voxel Engine Core
//!
//! This module contains the core voxel engine functionality, providing the foundation
//! for representing, manipulating, and rendering a voxel-based world.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Block ids, opacity, and the six faces of a block
//! * **Coords**: World/chunk/local coordinate conversions with floor division
//! * **Chunk**: A full-height column of blocks with its mesh and GPU handles
//! * **Terrain**: The deterministic height-field generator
//! * **World**: Owns the chunks and resolves world-space block access
//! * **Streaming**: Per-tick generation, meshing, upload and eviction around the viewer
//! * **Raycast**: First block face along a ray, for breaking and placing blocks
//! * **Tasks**: Background chunk generation
//!
//! ## Data Flow
//!
//! 1. The streaming pass reads the viewer position and creates missing chunks
//! 2. Dirty chunks are re-meshed, non-resident ones uploaded, and all are queued
//! 3. The renderer draws the queue, opaque first, then water
//! 4. Edits go through `World::set_block_id`, dirtying the owning chunk for step 2

pub mod block;
pub mod chunk;
pub mod coords;
pub mod error;
pub mod raycast;
pub mod streaming;
pub mod tasks;
pub mod terrain;
pub mod world;

pub use error::{BlockAccessError, SetOutcome};
pub use raycast::{BlockHit, GridBounds};
pub use streaming::StreamingReport;
pub use world::World;
