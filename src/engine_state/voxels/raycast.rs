//! # Ray / Voxel Intersection
//!
//! Finds the first solid block face along a ray, for block targeting.
//!
//! Each axis is walked independently: for every integer plane the segment
//! `origin .. origin + direction * max_length` crosses on that axis, the block on
//! the far side of the crossing is tested. The first solid block per axis is a
//! candidate, and the candidate whose crossing point is closest to the origin
//! wins. Exact distance ties go to X, then Y, then Z.
//!
//! Only planes bordering blocks inside a `GridBounds` box are visited, so the
//! cost of a trace is bounded by the size of the box rather than by
//! `max_length`.

use cgmath::{InnerSpace, Point3, Vector3};

use super::block::{BlockSide, BlockType};
use super::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH};
use super::coords::{block_containing, ChunkCoord};
use super::error::{BlockAccessError, SetOutcome};
use super::world::World;

/// A block face hit by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockHit {
    /// World coordinate of the block that was hit
    pub block: Point3<i32>,
    /// The face of that block the ray entered through
    pub face: BlockSide,
    /// Distance from the ray origin to the crossing point
    pub distance: f32,
}

impl BlockHit {
    /// The cell in front of the hit face, where a placed block would go.
    pub fn adjacent(&self) -> Point3<i32> {
        self.block + self.face.offset()
    }
}

/// Inclusive box of block coordinates outside which nothing is solid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    /// Lowest block coordinate on each axis
    pub min: Point3<i32>,
    /// Highest block coordinate on each axis
    pub max: Point3<i32>,
}

impl GridBounds {
    /// The whole `i32` grid.
    pub const UNBOUNDED: GridBounds = GridBounds {
        min: Point3 {
            x: i32::MIN,
            y: i32::MIN,
            z: i32::MIN,
        },
        max: Point3 {
            x: i32::MAX,
            y: i32::MAX,
            z: i32::MAX,
        },
    };

    /// The smallest box holding every loaded chunk, or `None` if no chunk is
    /// loaded.
    pub fn of_chunks<I>(coords: I) -> Option<GridBounds>
    where
        I: IntoIterator<Item = ChunkCoord>,
    {
        let mut coords = coords.into_iter();
        let first = coords.next()?;
        let (low, high) = coords.fold((first, first), |(low, high), coord| {
            (
                ChunkCoord::new(low.x.min(coord.x), low.z.min(coord.z)),
                ChunkCoord::new(high.x.max(coord.x), high.z.max(coord.z)),
            )
        });

        let top = high.origin();
        Some(GridBounds {
            min: low.origin(),
            max: Point3::new(top.x + CHUNK_WIDTH - 1, CHUNK_HEIGHT - 1, top.z + CHUNK_WIDTH - 1),
        })
    }
}

/// Traces a ray through the grid described by `is_solid`.
///
/// Axes with a zero direction component cross no plane and are skipped.
pub fn line_trace_to_face<F>(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_length: f32,
    is_solid: F,
) -> Option<BlockHit>
where
    F: Fn(Point3<i32>) -> bool,
{
    line_trace_in_bounds(origin, direction, max_length, GridBounds::UNBOUNDED, is_solid)
}

/// Like `line_trace_to_face`, but only tests blocks inside `bounds`.
pub fn line_trace_in_bounds<F>(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_length: f32,
    bounds: GridBounds,
    is_solid: F,
) -> Option<BlockHit>
where
    F: Fn(Point3<i32>) -> bool,
{
    let mut best: Option<BlockHit> = None;

    for axis in 0..3 {
        let Some(hit) = trace_axis(origin, direction, max_length, axis, &bounds, &is_solid) else {
            continue;
        };
        // Strictly closer only, so earlier axes win ties.
        if best.map_or(true, |current| hit.distance < current.distance) {
            best = Some(hit);
        }
    }

    best
}

fn trace_axis<F>(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_length: f32,
    axis: usize,
    bounds: &GridBounds,
    is_solid: &F,
) -> Option<BlockHit>
where
    F: Fn(Point3<i32>) -> bool,
{
    let d = direction[axis];
    if d == 0.0 {
        return None;
    }

    let start = origin[axis];
    let end = start + d * max_length;
    let positive = d > 0.0;

    // Crossing plane `p` enters block `p` going up the axis and block `p - 1`
    // going down it. Float to int casts saturate, so infinite reach is fine.
    let (low, high) = (bounds.min[axis], bounds.max[axis]);
    let planes: Box<dyn Iterator<Item = i32>> = if positive {
        let first = (start.ceil() as i32).max(low);
        let last = (end.floor() as i32).min(high);
        Box::new(first..=last)
    } else {
        let first = (start.floor() as i32).min(high.saturating_add(1));
        let last = (end.ceil() as i32).max(low.saturating_add(1));
        Box::new((last..=first).rev())
    };

    // A ray travelling up an axis enters through the face pointing down it.
    let facing_up_axis = match axis {
        0 => BlockSide::RIGHT,
        1 => BlockSide::TOP,
        _ => BlockSide::FRONT,
    };
    let face = if positive {
        facing_up_axis.opposite()
    } else {
        facing_up_axis
    };

    for plane in planes {
        let t = (plane as f32 - start) / d;
        if t < 0.0 {
            continue;
        }

        let mut crossing = origin + direction * t;
        crossing[axis] = plane as f32;

        let mut block = block_containing(crossing);
        if !positive {
            block[axis] -= 1;
        }

        if is_solid(block) {
            return Some(BlockHit {
                block,
                face,
                distance: (crossing - origin).magnitude(),
            });
        }
    }

    None
}

impl World {
    /// Traces a ray from `origin` along `direction` for `max_length` direction
    /// units and returns the first non-air block face it hits. Water counts as
    /// a hit; unloaded chunks and the space above and below the world do not.
    pub fn line_trace_to_face(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_length: f32,
    ) -> Option<BlockHit> {
        let bounds = GridBounds::of_chunks(self.chunks.keys().copied())?;
        line_trace_in_bounds(origin, direction, max_length, bounds, |block| {
            self.peek_block(block).is_some_and(BlockType::is_solid)
        })
    }

    /// Sets the hit block to air.
    pub fn break_block(&mut self, hit: &BlockHit) -> Result<SetOutcome, BlockAccessError> {
        self.set_block_id(hit.block, BlockType::AIR)
    }

    /// Places `block` in the cell in front of the hit face.
    pub fn place_block(
        &mut self,
        hit: &BlockHit,
        block: BlockType,
    ) -> Result<SetOutcome, BlockAccessError> {
        self.set_block_id(hit.adjacent(), block)
    }
}
