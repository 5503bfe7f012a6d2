//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation and processing.
//! They run on the world's task manager so that terrain generation and meshing
//! of newly visible chunks stay off the tick thread.

pub mod chunk_generation_task;

pub use chunk_generation_task::ChunkGenerationTask;
