//! # Coordinates Module
//!
//! Conversions between the three coordinate spaces of the voxel world:
//!
//! * **World** block coordinates: any `Point3<i32>`, Y restricted to `[0, CHUNK_HEIGHT)`
//! * **Chunk** coordinates: a `ChunkCoord` on the XZ plane (chunks span the full height)
//! * **Local** block coordinates: `[0, CHUNK_WIDTH) x [0, CHUNK_HEIGHT) x [0, CHUNK_WIDTH)`
//!
//! The invariant tying them together is
//! `world = chunk * CHUNK_WIDTH + local`, using floor division for negative world
//! coordinates (`-1` belongs to chunk `-1`, local `15`), never truncation.

use std::fmt;

use cgmath::Point3;

use super::chunk::CHUNK_WIDTH;

/// Position of a chunk on the XZ plane, in chunk units.
///
/// Chunks are full-height columns, so there is no Y component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk owning the given world block coordinate. Y is ignored.
    pub fn from_world(world: Point3<i32>) -> Self {
        Self {
            x: chunk_axis(world.x),
            z: chunk_axis(world.z),
        }
    }

    /// The chunk containing a continuous world-space position, e.g. the viewer.
    pub fn from_position(position: Point3<f32>) -> Self {
        let width = CHUNK_WIDTH as f32;
        Self {
            x: (position.x / width).floor() as i32,
            z: (position.z / width).floor() as i32,
        }
    }

    /// World block coordinate of this chunk's local origin `(0, 0, 0)`.
    pub fn origin(self) -> Point3<i32> {
        Point3::new(self.x * CHUNK_WIDTH, 0, self.z * CHUNK_WIDTH)
    }

    /// Converts a local block coordinate inside this chunk to world space.
    pub fn local_to_world(self, local: Point3<i32>) -> Point3<i32> {
        Point3::new(
            self.x * CHUNK_WIDTH + local.x,
            local.y,
            self.z * CHUNK_WIDTH + local.z,
        )
    }

    /// Chebyshev (square) distance between two chunk coordinates.
    pub fn chebyshev_distance(self, other: ChunkCoord) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.z - other.z).unsigned_abs())
    }

    /// All chunk coordinates within Chebyshev `radius` of `self`, row by row
    /// (X outer, Z inner).
    pub fn window(self, radius: u32) -> impl Iterator<Item = ChunkCoord> {
        let radius = radius as i32;
        let center = self;
        (-radius..=radius).flat_map(move |dx| {
            (-radius..=radius).map(move |dz| ChunkCoord::new(center.x + dx, center.z + dz))
        })
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Chunk index along one horizontal axis for a world block coordinate.
///
/// Floor division written the way the world format defines it:
/// `w < 0 ? (w - W + 1) / W : w / W`.
pub fn chunk_axis(world_axis: i32) -> i32 {
    if world_axis < 0 {
        (world_axis - CHUNK_WIDTH + 1) / CHUNK_WIDTH
    } else {
        world_axis / CHUNK_WIDTH
    }
}

/// Splits a world block coordinate into its owning chunk and the local offset.
pub fn world_to_local(world: Point3<i32>) -> (ChunkCoord, Point3<i32>) {
    let chunk = ChunkCoord::from_world(world);
    let local = Point3::new(
        world.x - chunk.x * CHUNK_WIDTH,
        world.y,
        world.z - chunk.z * CHUNK_WIDTH,
    );
    (chunk, local)
}

/// The block containing a continuous world-space position.
pub fn block_containing(position: Point3<f32>) -> Point3<i32> {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}
