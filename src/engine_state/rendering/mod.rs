//! Rendering system for the voxel engine.
//!
//! This module turns chunk block data into GPU-ready geometry and hands it to a GPU
//! backend. It contains:
//!
//! - `meshing`: face-culling mesh generation, split into opaque and water streams
//! - `Vertex`: the vertex format shared by the mesher and every backend
//! - `wgpu_backend`: a `GpuBackend` that writes real `wgpu` buffers
//! - `offscreen`: a windowless colour/depth target with the voxel pipeline
//!
//! A frame is rendered by letting the world record its draws on the backend,
//! then replaying them into a render pass (see `EngineState::render_into`).

pub mod meshing;
pub mod offscreen;
mod vertex;
pub mod wgpu_backend;

// Re-export commonly used types
pub use vertex::Vertex;
pub use offscreen::OffscreenTarget;
pub use wgpu_backend::{GpuInitError, WgpuBackend};
