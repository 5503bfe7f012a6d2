//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a full-height column of
//! `CHUNK_WIDTH x CHUNK_HEIGHT x CHUNK_WIDTH` blocks, together with the mesh built
//! from it and the GPU handles of that mesh.
//!
//! ## Storage
//!
//! Blocks are kept in one flat vector of `BlockTypeSize`, indexed as
//!
//! ```text
//! index = (y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x
//! ```
//!
//! so a horizontal slice is contiguous and the mesher walks memory in order.
//! Next to it, `opaque_array` keeps one bit per block telling whether the block
//! hides its neighbours' faces, which is all the culling pass needs to look at.
//!
//! ## Lifecycle
//!
//! 1. `Chunk::new` creates an all-air, dirty chunk
//! 2. The world calls `bind_world` and `gen_terrain`
//! 3. `build_mesh` regenerates both mesh streams and clears the dirty flag
//! 4. `send_to_gpu` uploads them and marks the chunk resident
//! 5. `free_gpu` releases the buffers; block data is kept for the next upload
//!
//! Any value-changing `set_block_id` marks the chunk dirty again.

use bitvec::prelude::BitVec;
use cgmath::Point3;
use log::{debug, warn};
use web_time::Instant;

use super::block::{BlockType, BlockTypeSize};
use super::coords::ChunkCoord;
use super::error::{BlockAccessError, SetOutcome};
use super::terrain::TerrainGenerator;
use crate::engine_state::buffer_state::{GpuBackend, MeshHandle};
use crate::engine_state::rendering::meshing::{build_chunk_mesh, ChunkMesh, MeshStream};

mod residency;

pub use residency::{ResidencyRegistry, WorldBinding, WorldId};

/// The width and depth of a chunk in blocks.
pub const CHUNK_WIDTH: i32 = 16;
/// The height of a chunk in blocks, which is also the height of the world.
pub const CHUNK_HEIGHT: i32 = 256;
/// The number of blocks in one horizontal slice of a chunk.
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_WIDTH * CHUNK_WIDTH;
/// The total number of blocks in a chunk.
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_HEIGHT;

/// A full-height column of voxel blocks.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    coord: ChunkCoord,

    /// Block ids in `(y, z, x)` major order, see the module docs.
    blocks: Vec<BlockTypeSize>,

    /// One bit per block, set when the block is opaque. Same indexing as `blocks`.
    opaque_array: BitVec,

    /// Set when the blocks changed since the last `build_mesh`.
    dirty: bool,

    /// The last mesh built from `blocks`.
    mesh: ChunkMesh,

    opaque_handle: Option<MeshHandle>,
    water_handle: Option<MeshHandle>,

    /// Owning world, if bound.
    world: Option<WorldId>,

    /// Residency registry of the owning world. An unbound chunk has its own.
    residency: ResidencyRegistry,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    ///
    /// The chunk starts dirty so the first `build_mesh` is never skipped.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: vec![BlockType::AIR.id(); CHUNK_SIZE as usize],
            opaque_array: BitVec::repeat(false, CHUNK_SIZE as usize),
            dirty: true,
            mesh: ChunkMesh::new(),
            opaque_handle: None,
            water_handle: None,
            world: None,
            residency: ResidencyRegistry::new(),
        }
    }

    /// Creates a chunk and fills it with terrain.
    pub fn generated(coord: ChunkCoord, generator: &TerrainGenerator) -> Self {
        let mut chunk = Self::new(coord);
        chunk.gen_terrain(generator);
        chunk
    }

    /// The chunk's coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Whether `local` lies inside `[0, W) x [0, H) x [0, W)`.
    pub fn is_coord_valid(local: Point3<i32>) -> bool {
        (0..CHUNK_WIDTH).contains(&local.x)
            && (0..CHUNK_HEIGHT).contains(&local.y)
            && (0..CHUNK_WIDTH).contains(&local.z)
    }

    /// Flat storage index of a valid local coordinate.
    fn index(local: Point3<i32>) -> usize {
        ((local.y * CHUNK_WIDTH + local.z) * CHUNK_WIDTH + local.x) as usize
    }

    /// Stored id at `local`, or `None` when out of range. Does not log.
    pub fn raw_id(&self, local: Point3<i32>) -> Option<BlockTypeSize> {
        if Self::is_coord_valid(local) {
            Some(self.blocks[Self::index(local)])
        } else {
            None
        }
    }

    /// Whether the block at `local` is opaque. Out-of-range coordinates are not.
    pub fn is_opaque_at(&self, local: Point3<i32>) -> bool {
        Self::is_coord_valid(local) && self.opaque_array[Self::index(local)]
    }

    /// Reads the block at a local coordinate.
    ///
    /// # Errors
    /// `BlockAccessError::OutOfBounds` if `local` is outside the chunk.
    pub fn get_block_id(&self, local: Point3<i32>) -> Result<BlockType, BlockAccessError> {
        match self.raw_id(local) {
            Some(id) => Ok(BlockType::from_id(id).unwrap_or(BlockType::AIR)),
            None => Err(self.out_of_bounds(local)),
        }
    }

    /// Writes the block at a local coordinate.
    ///
    /// Writing the value already stored returns `SetOutcome::Unchanged` and leaves
    /// the dirty flag alone; any other write marks the chunk dirty.
    ///
    /// # Errors
    /// `BlockAccessError::OutOfBounds` if `local` is outside the chunk.
    pub fn set_block_id(
        &mut self,
        local: Point3<i32>,
        block: BlockType,
    ) -> Result<SetOutcome, BlockAccessError> {
        if !Self::is_coord_valid(local) {
            return Err(self.out_of_bounds(local));
        }

        let index = Self::index(local);
        if self.blocks[index] == block.id() {
            return Ok(SetOutcome::Unchanged);
        }

        self.blocks[index] = block.id();
        self.opaque_array.set(index, block.is_opaque());
        self.dirty = true;
        Ok(SetOutcome::Changed(block))
    }

    fn out_of_bounds(&self, local: Point3<i32>) -> BlockAccessError {
        warn!(
            "Block access out of range in chunk {}: ({}, {}, {})",
            self.coord, local.x, local.y, local.z
        );
        BlockAccessError::OutOfBounds {
            x: local.x,
            y: local.y,
            z: local.z,
        }
    }

    /// Converts a local coordinate to a world block coordinate.
    pub fn coord_world(&self, local: Point3<i32>) -> Point3<i32> {
        self.coord.local_to_world(local)
    }

    /// Fills the whole column from the terrain generator and marks the chunk dirty.
    pub fn gen_terrain(&mut self, generator: &TerrainGenerator) {
        let origin = self.coord.origin();

        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                let height = generator.column_height(origin.x + x, origin.z + z);
                for y in 0..CHUNK_HEIGHT {
                    let block = generator.block_at(height, y);
                    let index = Self::index(Point3::new(x, y, z));
                    self.blocks[index] = block.id();
                    self.opaque_array.set(index, block.is_opaque());
                }
            }
        }

        self.dirty = true;
    }

    /// Regenerates both mesh streams from the current blocks.
    ///
    /// Clears the dirty flag and drops the chunk from the residency registry, so
    /// the new mesh is uploaded on the next `send_to_gpu`.
    pub fn build_mesh(&mut self) {
        self.mesh = build_chunk_mesh(self);
        self.dirty = false;
        self.residency.remove(self.coord);
    }

    /// Installs a mesh built elsewhere (e.g. on a worker thread) from these exact blocks.
    pub fn set_mesh(&mut self, mesh: ChunkMesh) {
        self.mesh = mesh;
        self.dirty = false;
        self.residency.remove(self.coord);
    }

    /// Uploads both streams, replacing any handles from a previous upload, and
    /// marks the chunk resident. Empty streams are not uploaded.
    pub fn send_to_gpu(&mut self, gpu: &mut dyn GpuBackend) {
        let start = Instant::now();
        self.release_handles(gpu);

        self.opaque_handle = upload_stream(gpu, &self.mesh.opaque);
        self.water_handle = upload_stream(gpu, &self.mesh.water);
        self.residency.insert(self.coord);

        debug!(
            "Uploaded chunk {} ({} vertices) in {:?}",
            self.coord,
            self.num_vertices(),
            start.elapsed()
        );
    }

    /// Releases the GPU buffers and marks the chunk not resident. Block data and
    /// the CPU-side mesh are kept.
    pub fn free_gpu(&mut self, gpu: &mut dyn GpuBackend) {
        self.release_handles(gpu);
        self.residency.remove(self.coord);
        debug!("Freed GPU buffers of chunk {}", self.coord);
    }

    fn release_handles(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(handle) = self.opaque_handle.take() {
            gpu.release(handle);
        }
        if let Some(handle) = self.water_handle.take() {
            gpu.release(handle);
        }
    }

    /// Draws the opaque stream. No-op if it is empty or the chunk is not resident.
    pub fn render_opaque(&self, gpu: &mut dyn GpuBackend) {
        if let (Some(handle), true) = (self.opaque_handle, self.is_in_gpu()) {
            gpu.draw(handle, self.mesh.opaque.index_count());
        }
    }

    /// Draws the water stream. No-op if it is empty or the chunk is not resident.
    pub fn render_water(&self, gpu: &mut dyn GpuBackend) {
        if let (Some(handle), true) = (self.water_handle, self.is_in_gpu()) {
            gpu.draw(handle, self.mesh.water.index_count());
        }
    }

    /// Whether the current mesh is uploaded.
    pub fn is_in_gpu(&self) -> bool {
        self.residency.contains(self.coord)
    }

    /// Whether the blocks changed since the last mesh build.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Vertices across both streams of the last built mesh.
    pub fn num_vertices(&self) -> u32 {
        self.mesh.num_vertices()
    }

    /// The last built mesh.
    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    /// Links the chunk to its world. Called once, right after construction.
    pub fn bind_world(&mut self, binding: WorldBinding) {
        if let Some(previous) = self.world {
            warn!(
                "Chunk {} rebound from {} to {}",
                self.coord, previous, binding.world
            );
        }
        self.world = Some(binding.world);
        self.residency = binding.residency;
    }

    /// The owning world, if bound.
    pub fn world(&self) -> Option<WorldId> {
        self.world
    }

    /// The residency registry this chunk reports to.
    pub fn residency(&self) -> &ResidencyRegistry {
        &self.residency
    }
}

fn upload_stream(gpu: &mut dyn GpuBackend, stream: &MeshStream) -> Option<MeshHandle> {
    if stream.is_empty() {
        None
    } else {
        Some(gpu.upload(&stream.vertices, &stream.indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::buffer_state::HeadlessBackend;
    use crate::engine_state::voxels::terrain::DEFAULT_SEA_LEVEL;

    #[test]
    fn test_set_get_round_trip() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.build_mesh();
        let local = Point3::new(5, 30, 5);

        assert_eq!(
            chunk.set_block_id(local, BlockType::STONE),
            Ok(SetOutcome::Changed(BlockType::STONE))
        );
        assert!(chunk.is_dirty());
        assert_eq!(chunk.get_block_id(local), Ok(BlockType::STONE));
        assert!(chunk.is_opaque_at(local));

        chunk.build_mesh();
        assert_eq!(
            chunk.set_block_id(local, BlockType::STONE),
            Ok(SetOutcome::Unchanged)
        );
        assert!(!chunk.is_dirty());

        chunk.set_block_id(local, BlockType::WATER).unwrap();
        assert!(!chunk.is_opaque_at(local));
    }

    #[test]
    fn test_out_of_range_access_is_an_error() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.build_mesh();

        for local in [
            Point3::new(16, 0, 0),
            Point3::new(-1, 0, 0),
            Point3::new(0, 256, 0),
            Point3::new(0, -1, 0),
            Point3::new(0, 0, 16),
        ] {
            assert_eq!(
                chunk.get_block_id(local),
                Err(BlockAccessError::OutOfBounds {
                    x: local.x,
                    y: local.y,
                    z: local.z
                })
            );
            assert!(chunk.set_block_id(local, BlockType::STONE).is_err());
        }
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn test_generated_chunk_scenario() {
        let generator = TerrainGenerator::new(42, DEFAULT_SEA_LEVEL);
        let mut chunk = Chunk::generated(ChunkCoord::new(0, 0), &generator);

        assert_eq!(chunk.get_block_id(Point3::new(0, 0, 0)), Ok(BlockType::BEDROCK));
        assert_eq!(chunk.get_block_id(Point3::new(0, 1, 0)), Ok(BlockType::STONE));
        assert_eq!(chunk.get_block_id(Point3::new(5, 255, 5)), Ok(BlockType::AIR));

        // Clear the cell and the one below so the edit is air -> stone over air.
        let local = Point3::new(5, 30, 5);
        chunk.set_block_id(local, BlockType::AIR).unwrap();
        chunk.set_block_id(Point3::new(5, 29, 5), BlockType::AIR).unwrap();
        chunk.build_mesh();

        assert_eq!(
            chunk.set_block_id(local, BlockType::STONE),
            Ok(SetOutcome::Changed(BlockType::STONE))
        );
        assert!(chunk.is_dirty());
        chunk.build_mesh();

        let bottom_at_block = chunk.mesh().opaque.vertices.iter().any(|v| {
            v.normal == [0.0, -1.0, 0.0]
                && v.position == [5.0, 30.0, 5.0]
                && v.block_id == BlockType::STONE.id() as f32
        });
        assert!(bottom_at_block);
    }

    #[test]
    fn test_gpu_lifecycle() {
        let mut gpu = HeadlessBackend::new();
        let mut chunk = Chunk::new(ChunkCoord::new(2, -3));
        chunk.set_block_id(Point3::new(0, 0, 0), BlockType::STONE).unwrap();
        chunk.set_block_id(Point3::new(0, 1, 0), BlockType::WATER).unwrap();
        chunk.build_mesh();
        assert!(!chunk.is_in_gpu());

        chunk.send_to_gpu(&mut gpu);
        assert!(chunk.is_in_gpu());
        assert_eq!(gpu.live_meshes(), 2);

        // Re-upload replaces the previous handles.
        chunk.send_to_gpu(&mut gpu);
        assert_eq!(gpu.live_meshes(), 2);
        assert_eq!(gpu.releases(), 2);

        chunk.render_opaque(&mut gpu);
        chunk.render_water(&mut gpu);
        let draws = gpu.take_draws();
        assert_eq!(draws.len(), 2);
        // Water does not hide the stone's top face, nor stone the water's bottom.
        assert_eq!(draws[0].index_count, 36);
        assert_eq!(draws[1].index_count, 36);

        chunk.free_gpu(&mut gpu);
        chunk.free_gpu(&mut gpu);
        assert!(!chunk.is_in_gpu());
        assert_eq!(gpu.live_meshes(), 0);
        assert_eq!(chunk.get_block_id(Point3::new(0, 0, 0)), Ok(BlockType::STONE));

        chunk.render_opaque(&mut gpu);
        assert!(gpu.draws().is_empty());
    }

    #[test]
    fn test_build_mesh_forces_reupload() {
        let mut gpu = HeadlessBackend::new();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set_block_id(Point3::new(3, 3, 3), BlockType::DIRT).unwrap();
        chunk.build_mesh();
        chunk.send_to_gpu(&mut gpu);

        chunk.build_mesh();
        assert!(!chunk.is_in_gpu());
    }

    #[test]
    fn test_empty_chunk_uploads_nothing() {
        let mut gpu = HeadlessBackend::new();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.build_mesh();
        chunk.send_to_gpu(&mut gpu);

        assert!(chunk.is_in_gpu());
        assert_eq!(gpu.uploads(), 0);
        chunk.render_opaque(&mut gpu);
        assert!(gpu.draws().is_empty());
    }

    #[test]
    fn test_bound_chunks_share_registry() {
        let registry = ResidencyRegistry::new();
        let world = WorldId::next();
        let mut gpu = HeadlessBackend::new();
        let mut a = Chunk::new(ChunkCoord::new(0, 0));
        let mut b = Chunk::new(ChunkCoord::new(1, 0));
        a.bind_world(WorldBinding {
            world,
            residency: registry.clone(),
        });
        b.bind_world(WorldBinding {
            world,
            residency: registry.clone(),
        });

        a.build_mesh();
        a.send_to_gpu(&mut gpu);

        assert_eq!(a.world(), Some(world));
        assert!(a.residency().same_as(b.residency()));
        assert_eq!(registry.snapshot(), vec![ChunkCoord::new(0, 0)]);
        assert!(!b.is_in_gpu());
        assert_eq!(a.coord_world(Point3::new(1, 2, 3)), Point3::new(1, 2, 3));
        assert_eq!(b.coord_world(Point3::new(1, 2, 3)), Point3::new(17, 2, 3));
    }
}
