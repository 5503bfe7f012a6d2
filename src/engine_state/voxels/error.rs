//! Block access errors and write outcomes.

use thiserror::Error;

use super::block::BlockType;

/// Why a block read or write could not be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockAccessError {
    /// The coordinate lies outside the chunk (local access) or outside the
    /// world's vertical range (world access).
    #[error("block coordinate ({x}, {y}, {z}) is out of bounds")]
    OutOfBounds {
        /// X coordinate of the rejected block
        x: i32,
        /// Y coordinate of the rejected block
        y: i32,
        /// Z coordinate of the rejected block
        z: i32,
    },

    /// The chunk owning the coordinate has not been created yet.
    #[error("chunk [{x}, {z}] is not loaded")]
    MissingChunk {
        /// X coordinate of the missing chunk, in chunks
        x: i32,
        /// Z coordinate of the missing chunk, in chunks
        z: i32,
    },
}

/// Result of a successful block write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The block changed to the contained type and its chunk is now dirty.
    Changed(BlockType),
    /// The block already had the requested type; nothing was touched.
    Unchanged,
}

impl SetOutcome {
    /// `true` if the write modified the world.
    pub fn is_changed(self) -> bool {
        matches!(self, SetOutcome::Changed(_))
    }
}
