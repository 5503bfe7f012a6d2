//! GPU residency bookkeeping shared by the chunks of one world.
//!
//! A chunk is *resident* when its current mesh has been uploaded. The set of
//! resident coordinates lives in one lock-guarded registry per world; every chunk
//! of that world holds a clone of the handle.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::MtResource;
use crate::engine_state::voxels::coords::ChunkCoord;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a world, used by chunks to refer back to their owner without
/// holding a reference to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldId(u64);

impl WorldId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// The set of chunk coordinates whose meshes are currently on the GPU.
#[derive(Clone)]
pub struct ResidencyRegistry {
    resident: MtResource<HashSet<ChunkCoord>>,
}

impl ResidencyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            resident: MtResource::new(HashSet::new()),
        }
    }

    /// Marks `coord` as resident.
    pub fn insert(&self, coord: ChunkCoord) {
        self.resident.get_mut().insert(coord);
    }

    /// Marks `coord` as not resident.
    pub fn remove(&self, coord: ChunkCoord) {
        self.resident.get_mut().remove(&coord);
    }

    /// Membership test.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.resident.get().contains(&coord)
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.resident.get().len()
    }

    /// `true` if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.resident.get().is_empty()
    }

    /// A copy of the resident coordinates, sorted, so callers can mutate chunks
    /// (and through them the registry) while iterating.
    pub fn snapshot(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.resident.get().iter().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// `true` if both handles refer to the same registry.
    pub fn same_as(&self, other: &ResidencyRegistry) -> bool {
        self.resident.ptr_eq(&other.resident)
    }
}

impl Default for ResidencyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResidencyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResidencyRegistry")
            .field("resident", &self.len())
            .finish()
    }
}

/// A chunk's non-owning link to the world it belongs to.
#[derive(Clone, Debug)]
pub struct WorldBinding {
    /// The owning world
    pub world: WorldId,
    /// That world's residency registry
    pub residency: ResidencyRegistry,
}
