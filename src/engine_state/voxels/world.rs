//! # World Module
//!
//! This module provides the `World` struct which owns every chunk of the voxel
//! world and is the entry point for block access, streaming and ray tracing.
//!
//! ## Architecture
//!
//! The world uses sparse storage: a chunk exists only once the streaming window has
//! reached it. Chunks are keyed by `ChunkCoord` in a hash map and never removed;
//! leaving the window only frees their GPU buffers.
//!
//! Each world owns one `ResidencyRegistry`, shared with its chunks through
//! `Chunk::bind_world`, recording which chunks currently have their mesh on the GPU.
//!
//! ## Related modules
//!
//! - `streaming`: `smart_rendering_preprocess` and the render queue
//! - `raycast`: `line_trace_to_face` and the block editing helpers
//!
//! ## Background Generation
//!
//! `World::with_workers` attaches a `TaskManager`. New chunks are then generated
//! and meshed on worker threads and integrated on the next streaming pass; until
//! then their coordinates are pending and read as `MissingChunk`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, info, warn};

use super::block::BlockType;
use super::chunk::{Chunk, ResidencyRegistry, WorldBinding, WorldId, CHUNK_HEIGHT};
use super::coords::{world_to_local, ChunkCoord};
use super::error::{BlockAccessError, SetOutcome};
use super::terrain::{TerrainGenerator, DEFAULT_SEA_LEVEL};
use crate::engine_state::buffer_state::GpuBackend;
use crate::engine_state::task_management::TaskManager;

/// A voxel world composed of full-height chunks.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use octacubic::engine_state::voxels::{block::BlockType, coords::ChunkCoord, world::World};
///
/// let mut world = World::new(42);
/// world.load_chunk(ChunkCoord::new(0, 0));
///
/// assert_eq!(world.get_block_id(Point3::new(0, 0, 0)), Ok(BlockType::BEDROCK));
/// assert!(world.get_block_id(Point3::new(0, 0, 16)).is_err());
/// ```
pub struct World {
    id: WorldId,

    /// A mapping from chunk coordinates to chunk data.
    pub(super) chunks: HashMap<ChunkCoord, Chunk>,

    /// Terrain generator, shared with background tasks.
    pub(super) generator: Arc<TerrainGenerator>,

    /// Coordinates whose mesh is on the GPU. Shared with every chunk.
    pub(super) residency: ResidencyRegistry,

    /// Chunks ready to draw this frame, in window order.
    pub(super) render_queue: Vec<ChunkCoord>,

    /// Vertices across every queued chunk.
    pub(super) visible_vertices: u64,

    /// Coordinates handed to a background task and not yet integrated.
    pub(super) pending: HashSet<ChunkCoord>,

    /// Background workers, if enabled.
    pub(super) task_manager: Option<TaskManager<World>>,
}

impl World {
    /// Creates an empty world for `seed` at the default sea level.
    pub fn new(seed: u32) -> Self {
        Self::with_generator(TerrainGenerator::new(seed, DEFAULT_SEA_LEVEL))
    }

    /// Creates an empty world around an existing terrain generator.
    pub fn with_generator(generator: TerrainGenerator) -> Self {
        let id = WorldId::next();
        info!(
            "Created {} (seed {}, sea level {})",
            id,
            generator.seed(),
            generator.sea_level()
        );

        World {
            id,
            chunks: HashMap::new(),
            generator: Arc::new(generator),
            residency: ResidencyRegistry::new(),
            render_queue: Vec::new(),
            visible_vertices: 0,
            pending: HashSet::new(),
            task_manager: None,
        }
    }

    /// Enables background chunk generation on `num_workers` threads.
    /// Zero keeps the world synchronous.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.task_manager = (num_workers > 0).then(|| TaskManager::new(num_workers));
        self
    }

    /// This world's identity.
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// The terrain seed.
    pub fn seed(&self) -> u32 {
        self.generator.seed()
    }

    /// The sea-level altitude.
    pub fn sea_level(&self) -> i32 {
        self.generator.sea_level()
    }

    /// The terrain generator.
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// The residency registry shared by this world's chunks.
    pub fn residency(&self) -> &ResidencyRegistry {
        &self.residency
    }

    fn binding(&self) -> WorldBinding {
        WorldBinding {
            world: self.id,
            residency: self.residency.clone(),
        }
    }

    /// Reads the block at a world coordinate.
    ///
    /// # Errors
    /// - `OutOfBounds` if `y` is outside `[0, CHUNK_HEIGHT)`
    /// - `MissingChunk` if the owning chunk has not been created
    pub fn get_block_id(&self, world: Point3<i32>) -> Result<BlockType, BlockAccessError> {
        let (coord, local) = self.resolve(world)?;
        match self.chunks.get(&coord) {
            Some(chunk) => chunk.get_block_id(local),
            None => Err(BlockAccessError::MissingChunk {
                x: coord.x,
                z: coord.z,
            }),
        }
    }

    /// Writes the block at a world coordinate and marks its chunk dirty if the
    /// value changed. Never creates chunks.
    ///
    /// # Errors
    /// Same as `get_block_id`.
    pub fn set_block_id(
        &mut self,
        world: Point3<i32>,
        block: BlockType,
    ) -> Result<SetOutcome, BlockAccessError> {
        let (coord, local) = self.resolve(world)?;
        match self.chunks.get_mut(&coord) {
            Some(chunk) => chunk.set_block_id(local, block),
            None => {
                debug!("Write to unloaded chunk {} ignored", coord);
                Err(BlockAccessError::MissingChunk {
                    x: coord.x,
                    z: coord.z,
                })
            }
        }
    }

    /// Block at a world coordinate, or `None` for anything unreadable. Does not log.
    pub fn peek_block(&self, world: Point3<i32>) -> Option<BlockType> {
        if !(0..CHUNK_HEIGHT).contains(&world.y) {
            return None;
        }
        let (coord, local) = world_to_local(world);
        let id = self.chunks.get(&coord)?.raw_id(local)?;
        BlockType::from_id(id)
    }

    fn resolve(&self, world: Point3<i32>) -> Result<(ChunkCoord, Point3<i32>), BlockAccessError> {
        if !(0..CHUNK_HEIGHT).contains(&world.y) {
            warn!(
                "Block access out of range: ({}, {}, {})",
                world.x, world.y, world.z
            );
            return Err(BlockAccessError::OutOfBounds {
                x: world.x,
                y: world.y,
                z: world.z,
            });
        }
        Ok(world_to_local(world))
    }

    /// The chunk at `coord`, if it exists.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Mutable access to the chunk at `coord`, if it exists.
    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Returns the chunk at `coord`, creating, binding and terrain-generating it
    /// synchronously if it does not exist yet.
    pub fn load_chunk(&mut self, coord: ChunkCoord) -> &mut Chunk {
        let binding = self.binding();
        let generator = self.generator.clone();
        self.pending.remove(&coord);

        self.chunks.entry(coord).or_insert_with(|| {
            let mut chunk = Chunk::new(coord);
            chunk.bind_world(binding);
            chunk.gen_terrain(&generator);
            debug!("Generated chunk {}", coord);
            chunk
        })
    }

    /// Adds a chunk built elsewhere (a background task, a test) to the world and
    /// binds it. An existing chunk at the same coordinate is kept.
    ///
    /// # Returns
    /// `true` if the chunk was inserted.
    pub fn integrate_chunk(&mut self, mut chunk: Chunk) -> bool {
        let coord = chunk.coord();
        self.pending.remove(&coord);

        if self.chunks.contains_key(&coord) {
            debug!("Discarding duplicate chunk {}", coord);
            return false;
        }

        chunk.bind_world(self.binding());
        self.chunks.insert(coord, chunk);
        true
    }

    /// Whether a background task is generating `coord`.
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    /// Number of coordinates being generated in the background.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Applies every background result that has arrived, without blocking.
    pub fn integrate_background_results(&mut self) -> usize {
        let Some(mut task_manager) = self.task_manager.take() else {
            return 0;
        };
        let handled = task_manager.process_completed_tasks(self);
        task_manager.process_queued_tasks();
        self.task_manager = Some(task_manager);
        handled
    }

    /// Blocks until every background task has finished and been integrated.
    pub fn wait_for_background(&mut self) {
        if let Some(mut task_manager) = self.task_manager.take() {
            task_manager.wait_for_all(self);
            self.task_manager = Some(task_manager);
        }
    }

    /// Number of chunks in memory.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of chunks whose mesh is on the GPU.
    pub fn num_chunks_in_gpu(&self) -> usize {
        self.residency.len()
    }

    /// Vertices across every chunk queued by the last streaming pass.
    pub fn visible_vertex_count(&self) -> u64 {
        self.visible_vertices
    }

    /// Chunks queued for drawing by the last streaming pass, in window order.
    pub fn render_queue(&self) -> &[ChunkCoord] {
        &self.render_queue
    }

    /// Frees the GPU buffers of every chunk and empties the render queue.
    /// Block data is kept.
    pub fn release_all(&mut self, gpu: &mut dyn GpuBackend) {
        for chunk in self.chunks.values_mut() {
            chunk.free_gpu(gpu);
        }
        self.render_queue.clear();
        self.visible_vertices = 0;
        info!("Released GPU buffers of {}", self.id);
    }
}
