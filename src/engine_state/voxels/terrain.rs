//! # Terrain Module
//!
//! Deterministic height-field terrain. Every column of the world gets one surface
//! height computed from two octaves of 2D Perlin noise, and every cell of the
//! column is classified against that height and the sea level.
//!
//! The generator is a pure function of `(seed, world x, world z)`: generating the
//! same chunk twice, on any thread, yields identical blocks.

use noise::{NoiseFn, Perlin};

use super::block::BlockType;

/// Altitude of the sea surface, in blocks.
pub const DEFAULT_SEA_LEVEL: i32 = 23;

/// Horizontal scale of the low-frequency octave.
const BASE_OCTAVE_SCALE: f32 = 32.0;
/// Amplitude of the low-frequency octave.
const BASE_OCTAVE_AMPLITUDE: f32 = 32.0;
/// Horizontal scale of the detail octave.
const DETAIL_OCTAVE_SCALE: f32 = 16.0;
/// Amplitude of the detail octave.
const DETAIL_OCTAVE_AMPLITUDE: f32 = 12.0;
/// Height added to every column.
const BASE_HEIGHT: f32 = 10.0;

/// Columns higher than `sea + MOUNTAIN_MARGIN` are stretched upwards.
const MOUNTAIN_MARGIN: f32 = 5.0;
/// Columns lower than `sea - BASIN_MARGIN` are stretched downwards.
const BASIN_MARGIN: f32 = 3.0;
/// Slope of the contrast stretch applied beyond the margins.
const STRETCH_FACTOR: f32 = 2.0;

/// Surface is snow above `sea + SNOW_LINE`.
const SNOW_LINE: f32 = 12.0;
/// Surface is grass above `sea + GRASS_LINE`, sand below.
const GRASS_LINE: f32 = 2.0;

/// Height-field terrain generator for one world seed.
#[derive(Clone)]
pub struct TerrainGenerator {
    seed: u32,
    sea_level: i32,
    perlin: Perlin,
}

impl TerrainGenerator {
    /// Creates a generator for `seed` with the given sea level.
    pub fn new(seed: u32, sea_level: i32) -> Self {
        TerrainGenerator {
            seed,
            sea_level,
            perlin: Perlin::new(seed),
        }
    }

    /// The world seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The sea-level altitude.
    pub fn sea_level(&self) -> i32 {
        self.sea_level
    }

    /// Samples the noise oracle, clamped to `[-1, 1]`.
    pub fn noise(&self, x: f32, y: f32) -> f32 {
        (self.perlin.get([x as f64, y as f64]) as f32).clamp(-1.0, 1.0)
    }

    /// Surface height of the column at world `(x, z)`, after the contrast stretch.
    pub fn column_height(&self, world_x: i32, world_z: i32) -> f32 {
        let x = world_x as f32;
        let z = world_z as f32;

        let base = (self.noise(x / BASE_OCTAVE_SCALE, z / BASE_OCTAVE_SCALE) * 0.5 + 0.5)
            * BASE_OCTAVE_AMPLITUDE;
        let detail = self.noise(x / DETAIL_OCTAVE_SCALE, z / DETAIL_OCTAVE_SCALE)
            * 0.5
            * DETAIL_OCTAVE_AMPLITUDE;

        self.stretch(base + detail + BASE_HEIGHT)
    }

    /// Piecewise-linear contrast stretch around sea level: mountains are pushed
    /// higher and basins deeper; heights between the margins are untouched.
    pub fn stretch(&self, height: f32) -> f32 {
        let sea = self.sea_level as f32;
        let mountain_floor = sea + MOUNTAIN_MARGIN;
        let basin_ceiling = sea - BASIN_MARGIN;

        if height > mountain_floor {
            mountain_floor + (height - mountain_floor) * STRETCH_FACTOR
        } else if height < basin_ceiling {
            basin_ceiling - (basin_ceiling - height) * STRETCH_FACTOR
        } else {
            height
        }
    }

    /// Classifies cell `y` of a column whose surface height is `height`.
    pub fn block_at(&self, height: f32, y: i32) -> BlockType {
        let sea = self.sea_level as f32;
        let cell = y as f32;

        if y == 0 {
            BlockType::BEDROCK
        } else if cell < height - 4.0 {
            BlockType::STONE
        } else if cell < height - 1.0 {
            BlockType::DIRT
        } else if cell < height {
            if height > sea + SNOW_LINE {
                BlockType::SNOW
            } else if height > sea + GRASS_LINE {
                BlockType::GRASS
            } else {
                BlockType::SAND
            }
        } else if cell > sea {
            BlockType::AIR
        } else {
            BlockType::WATER
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(block: BlockType) -> u8 {
        match block {
            BlockType::BEDROCK => 0,
            BlockType::STONE => 1,
            BlockType::DIRT => 2,
            BlockType::SAND | BlockType::GRASS | BlockType::SNOW => 3,
            BlockType::AIR | BlockType::WATER => 4,
        }
    }

    #[test]
    fn test_column_height_is_deterministic() {
        let a = TerrainGenerator::new(42, DEFAULT_SEA_LEVEL);
        let b = TerrainGenerator::new(42, DEFAULT_SEA_LEVEL);
        for x in -40..40 {
            assert_eq!(a.column_height(x, x * 7 - 3), b.column_height(x, x * 7 - 3));
        }
    }

    #[test]
    fn test_origin_column_height() {
        // Lattice points of the gradient noise sample to zero.
        let generator = TerrainGenerator::new(42, DEFAULT_SEA_LEVEL);
        let height = generator.column_height(0, 0);
        assert!((height - 26.0).abs() < 1e-4, "height was {}", height);
        assert_eq!(generator.block_at(height, 0), BlockType::BEDROCK);
        assert_eq!(generator.block_at(height, 1), BlockType::STONE);
    }

    #[test]
    fn test_stretch_exaggerates_beyond_margins() {
        let generator = TerrainGenerator::new(1, 23);
        assert_eq!(generator.stretch(25.0), 25.0);
        assert_eq!(generator.stretch(30.0), 32.0);
        assert_eq!(generator.stretch(18.0), 16.0);
        assert_eq!(generator.stretch(28.0), 28.0);
        assert_eq!(generator.stretch(20.0), 20.0);
    }

    #[test]
    fn test_surface_material_by_height_band() {
        let generator = TerrainGenerator::new(1, 23);
        assert_eq!(generator.block_at(40.0, 39), BlockType::SNOW);
        assert_eq!(generator.block_at(30.0, 29), BlockType::GRASS);
        assert_eq!(generator.block_at(24.5, 24), BlockType::SAND);
        assert_eq!(generator.block_at(10.0, 20), BlockType::WATER);
        assert_eq!(generator.block_at(10.0, 23), BlockType::WATER);
        assert_eq!(generator.block_at(10.0, 24), BlockType::AIR);
    }

    #[test]
    fn test_bands_never_go_backwards() {
        let generator = TerrainGenerator::new(7, DEFAULT_SEA_LEVEL);
        for x in -20..20 {
            for z in [-9, 0, 13] {
                let height = generator.column_height(x, z);
                let mut previous = 0;
                for y in 0..256 {
                    let current = band(generator.block_at(height, y));
                    assert!(
                        current >= previous,
                        "band went from {} to {} at ({}, {}, {})",
                        previous,
                        current,
                        x,
                        y,
                        z
                    );
                    previous = current;
                }
            }
        }
    }
}
