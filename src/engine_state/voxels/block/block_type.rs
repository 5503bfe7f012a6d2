//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world.
//! It provides block type identification, conversion from the compact storage
//! integer, and the opacity rule used by face culling.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminants are the block ids stored in chunks and written into the
/// vertex stream, so they must never be renumbered. The gap between `SNOW` and
/// `WATER` is intentional: ids 7 to 9 are unassigned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum BlockType {
    /// Empty space. Non-opaque, never meshed.
    AIR = 0,

    /// The indestructible floor placed at `y == 0` of every column.
    BEDROCK = 1,

    /// Bulk material below the dirt layer.
    STONE = 2,

    /// The layers just below the surface block.
    DIRT = 3,

    /// Surface block of mid-altitude columns.
    GRASS = 4,

    /// Surface block of columns near or below sea level.
    SAND = 5,

    /// Surface block of high mountain columns.
    SNOW = 6,

    /// Translucent fluid filling the space between the surface and sea level.
    /// Meshed into its own stream.
    WATER = 10,
}

impl BlockType {
    /// Converts a stored `BlockTypeSize` back to a `BlockType`.
    ///
    /// # Returns
    /// `None` if the value is not an assigned block id.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        FromPrimitive::from_u8(id)
    }

    /// The compact id used in chunk storage and vertex data.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// Whether this block hides the faces of its neighbours.
    ///
    /// Everything except air and water is opaque.
    pub fn is_opaque(self) -> bool {
        Self::is_opaque_id(self as BlockTypeSize)
    }

    /// Opacity test on the raw storage id.
    pub fn is_opaque_id(id: BlockTypeSize) -> bool {
        id != BlockType::AIR as BlockTypeSize && id != BlockType::WATER as BlockTypeSize
    }

    /// Whether a ray stops on this block. Any non-air block counts, water included.
    pub fn is_solid(self) -> bool {
        self != BlockType::AIR
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as BlockTypeSize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_storage() {
        for block in [
            BlockType::AIR,
            BlockType::BEDROCK,
            BlockType::STONE,
            BlockType::DIRT,
            BlockType::GRASS,
            BlockType::SAND,
            BlockType::SNOW,
            BlockType::WATER,
        ] {
            assert_eq!(BlockType::from_id(block.id()), Some(block));
        }
        assert_eq!(BlockType::WATER.id(), 10);
        assert_eq!(BlockType::from_id(7), None);
    }

    #[test]
    fn test_air_and_water_are_not_opaque() {
        assert!(!BlockType::AIR.is_opaque());
        assert!(!BlockType::WATER.is_opaque());
        assert!(BlockType::STONE.is_opaque());
        assert!(BlockType::SNOW.is_opaque());
        assert!(BlockType::WATER.is_solid());
        assert!(!BlockType::AIR.is_solid());
    }
}
