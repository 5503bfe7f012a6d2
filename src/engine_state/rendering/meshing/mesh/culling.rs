//! Face-culling mesh generation.
//!
//! Every non-air block contributes one quad per face that is not hidden:
//!
//! - Opaque blocks emit a face when the neighbour across it is air, water, or
//!   outside the chunk. A block with six opaque neighbours is skipped outright.
//! - Water blocks go to the water stream and emit a face when the neighbour is
//!   anything but water, so the surface and the walls against air or stone show.
//!
//! Neighbouring chunks are never consulted: faces on the chunk boundary are always
//! emitted.

use cgmath::Point3;
use log::debug;
use web_time::Instant;

use crate::engine_state::voxels::{
    block::{BlockSide, BlockType},
    chunk::{Chunk, CHUNK_HEIGHT, CHUNK_WIDTH},
};

use super::{face::Face, mesh::ChunkMesh};

/// Builds both mesh streams of `chunk`, in world space.
pub fn build_chunk_mesh(chunk: &Chunk) -> ChunkMesh {
    let start = Instant::now();
    let mut mesh = ChunkMesh::new();
    let origin = chunk.coord().origin();
    let water = BlockType::WATER.id();

    for y in 0..CHUNK_HEIGHT {
        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                let local = Point3::new(x, y, z);
                let id = match chunk.raw_id(local) {
                    Some(id) if id != BlockType::AIR.id() => id,
                    _ => continue,
                };
                let block_origin =
                    Point3::new((origin.x + x) as f32, y as f32, (origin.z + z) as f32);

                if id == water {
                    for side in BlockSide::all() {
                        if chunk.raw_id(local + side.offset()) != Some(water) {
                            mesh.water.add_face(&Face::new(block_origin, id, side));
                        }
                    }
                    continue;
                }

                if is_enclosed(chunk, local) {
                    continue;
                }

                for side in BlockSide::all() {
                    if !chunk.is_opaque_at(local + side.offset()) {
                        mesh.opaque.add_face(&Face::new(block_origin, id, side));
                    }
                }
            }
        }
    }

    debug!(
        "Meshed chunk {} in {:?}: {} opaque faces, {} water faces",
        chunk.coord(),
        start.elapsed(),
        mesh.opaque.face_count(),
        mesh.water.face_count()
    );

    mesh
}

/// `true` if all six neighbours of `local` are opaque blocks inside the chunk.
fn is_enclosed(chunk: &Chunk, local: Point3<i32>) -> bool {
    BlockSide::all()
        .into_iter()
        .all(|side| chunk.is_opaque_at(local + side.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::coords::ChunkCoord;

    fn chunk_with(blocks: &[(i32, i32, i32, BlockType)]) -> Chunk {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        for &(x, y, z, block) in blocks {
            chunk
                .set_block_id(Point3::new(x, y, z), block)
                .expect("coordinates are in range");
        }
        chunk
    }

    #[test]
    fn test_isolated_voxel_emits_six_faces() {
        let chunk = chunk_with(&[(5, 30, 5, BlockType::STONE)]);
        let mesh = build_chunk_mesh(&chunk);

        assert_eq!(mesh.opaque.vertices.len(), 24);
        assert_eq!(mesh.opaque.indices.len(), 36);
        assert!(mesh.water.is_empty());
    }

    #[test]
    fn test_enclosed_voxel_emits_nothing() {
        let mut blocks = vec![(5, 30, 5, BlockType::STONE)];
        for side in BlockSide::all() {
            let n = Point3::new(5, 30, 5) + side.offset();
            blocks.push((n.x, n.y, n.z, BlockType::DIRT));
        }
        let chunk = chunk_with(&blocks);
        let mesh = build_chunk_mesh(&chunk);

        // Six neighbours with five visible faces each; the centre is fully hidden.
        assert_eq!(mesh.opaque.face_count(), 30);
        assert!(mesh
            .opaque
            .vertices
            .iter()
            .all(|v| v.block_id != BlockType::STONE.id() as f32));
    }

    #[test]
    fn test_adjacent_voxels_share_no_faces() {
        let chunk = chunk_with(&[(3, 10, 3, BlockType::STONE), (4, 10, 3, BlockType::STONE)]);
        let mesh = build_chunk_mesh(&chunk);
        assert_eq!(mesh.opaque.face_count(), 10);
    }

    #[test]
    fn test_water_culls_against_water_only() {
        let chunk = chunk_with(&[
            (3, 10, 3, BlockType::WATER),
            (4, 10, 3, BlockType::WATER),
            (3, 9, 3, BlockType::STONE),
        ]);
        let mesh = build_chunk_mesh(&chunk);

        // Two water cells sharing one face: 12 - 2 faces, including the one above the stone.
        assert_eq!(mesh.water.face_count(), 10);
        // Water does not hide the stone's top face.
        assert_eq!(mesh.opaque.face_count(), 6);
        assert!(mesh
            .water
            .vertices
            .iter()
            .all(|v| v.block_id == BlockType::WATER.id() as f32));
    }

    #[test]
    fn test_boundary_faces_are_always_emitted() {
        let mut chunk = Chunk::new(ChunkCoord::new(-1, 2));
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                chunk
                    .set_block_id(Point3::new(x, 0, z), BlockType::BEDROCK)
                    .expect("in range");
            }
        }
        let mesh = build_chunk_mesh(&chunk);

        // Top and bottom of every cell, plus four walls of 16 faces on the boundary.
        let expected = 2 * CHUNK_WIDTH * CHUNK_WIDTH + 4 * CHUNK_WIDTH;
        assert_eq!(mesh.opaque.face_count(), expected as usize);
        let min_x = mesh
            .opaque
            .vertices
            .iter()
            .map(|v| v.position[0])
            .fold(f32::MAX, f32::min);
        assert_eq!(min_x, -16.0);
    }

    #[test]
    fn test_air_chunk_is_empty() {
        let chunk = Chunk::new(ChunkCoord::new(0, 0));
        let mesh = build_chunk_mesh(&chunk);
        assert_eq!(mesh.num_vertices(), 0);
    }
}
