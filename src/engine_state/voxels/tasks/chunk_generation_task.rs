//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which generates and meshes a
//! chunk on a worker thread. It is scheduled by the world's streaming pass when a
//! coordinate enters the view window and background workers are enabled.

use std::sync::Arc;

use log::debug;
use web_time::Instant;

use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{chunk::Chunk, coords::ChunkCoord, terrain::TerrainGenerator, world::World},
};

/// A task that generates terrain for one chunk and builds its mesh.
///
/// The task owns everything it needs: the coordinate and a shared handle to the
/// world's (immutable) terrain generator. The chunk it produces is unbound; the
/// world binds it when the result is applied.
pub struct ChunkGenerationTask {
    /// Generator of the world the chunk belongs to
    generator: Arc<TerrainGenerator>,
    /// The coordinate of the chunk to generate
    coord: ChunkCoord,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    pub fn new(generator: Arc<TerrainGenerator>, coord: ChunkCoord) -> Self {
        ChunkGenerationTask { generator, coord }
    }
}

impl Task<World> for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult<World> + Send> {
        let start = Instant::now();

        let mut chunk = Chunk::generated(self.coord, &self.generator);
        chunk.build_mesh();

        debug!(
            "Generated chunk {} off-thread in {:?}",
            self.coord,
            start.elapsed()
        );

        Box::new(ChunkGenerationTaskResult { chunk })
    }
}

/// The result of a chunk generation task: a terrain-filled, meshed chunk.
pub struct ChunkGenerationTaskResult {
    chunk: Chunk,
}

impl TaskResult<World> for ChunkGenerationTaskResult {
    /// Hands the chunk to the world, which binds it and makes it visible to the
    /// next streaming pass.
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task<World> + Send>> {
        world.integrate_chunk(self.chunk);
        Vec::new()
    }
}
