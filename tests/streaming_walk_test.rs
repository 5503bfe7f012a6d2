//! # Streaming Walk Integration Test
//!
//! Walks a viewer across the world and checks that the GPU-resident set always
//! matches the streaming window, that evicted chunks keep their data, and that
//! background generation converges to the same world as synchronous generation.

use cgmath::Point3;
use octacubic::engine_state::buffer_state::{GpuBackend, HeadlessBackend};
use octacubic::engine_state::voxels::block::BlockType;
use octacubic::engine_state::voxels::coords::ChunkCoord;
use octacubic::engine_state::voxels::World;

fn assert_window_resident(world: &World, viewer: Point3<f32>, view_distance: u32) {
    let mut window: Vec<ChunkCoord> = ChunkCoord::from_position(viewer)
        .window(view_distance)
        .collect();
    window.sort_unstable();

    assert_eq!(world.residency().snapshot(), window, "viewer at {:?}", viewer);
    assert_eq!(world.render_queue().len(), window.len());

    for coord in world.render_queue() {
        let chunk = world.chunk(*coord).expect("queued chunk exists");
        assert!(!chunk.is_dirty(), "{} is dirty", coord);
        assert!(chunk.is_in_gpu(), "{} is not resident", coord);
    }
}

/// Walk 20 chunks east in quarter-chunk steps.
#[test]
fn test_resident_set_follows_the_viewer() {
    let mut gpu = HeadlessBackend::new();
    let mut world = World::new(42);
    let view_distance = 2;

    let mut x = 0.0f32;
    while x < 16.0 * 20.0 {
        let viewer = Point3::new(x, 64.0, -3.0);
        world.smart_rendering_preprocess(&mut gpu, viewer, view_distance);
        assert_window_resident(&world, viewer, view_distance);
        x += 4.0;
    }

    // Every chunk ever entered stays in memory; only the window is on the GPU.
    assert_eq!(world.chunk_count(), 5 * (20 + 4));
    assert_eq!(world.num_chunks_in_gpu(), 25);
    assert_eq!(gpu.analytics().live_meshes as usize, gpu.live_meshes());
}

#[test]
fn test_evicted_chunk_keeps_its_edits() {
    let mut gpu = HeadlessBackend::new();
    let mut world = World::new(42);
    let home = Point3::new(8.0, 64.0, 8.0);
    let away = Point3::new(8.0 + 16.0 * 10.0, 64.0, 8.0);
    let edited = Point3::new(5, 200, 5);

    world.smart_rendering_preprocess(&mut gpu, home, 1);
    assert!(world
        .set_block_id(edited, BlockType::STONE)
        .expect("chunk is loaded")
        .is_changed());

    world.smart_rendering_preprocess(&mut gpu, away, 1);
    let origin = world.chunk(ChunkCoord::new(0, 0)).expect("still in memory");
    assert!(!origin.is_in_gpu());
    assert!(origin.is_dirty(), "edit made after meshing is still pending");
    let chunks_while_away = world.chunk_count();

    let report = world.smart_rendering_preprocess(&mut gpu, home, 1);

    // Nothing was regenerated; the edited chunk is re-meshed, all nine re-uploaded.
    assert_eq!(report.created, 0);
    assert_eq!(report.meshed, 1);
    assert_eq!(report.uploaded, 9);
    assert_eq!(world.chunk_count(), chunks_while_away);
    assert_eq!(world.get_block_id(edited), Ok(BlockType::STONE));
    assert_window_resident(&world, home, 1);
}

#[test]
fn test_negative_quadrant_streaming() {
    let mut gpu = HeadlessBackend::new();
    let mut world = World::new(7);
    let viewer = Point3::new(-0.5, 80.0, -16.5);

    let report = world.smart_rendering_preprocess(&mut gpu, viewer, 1);

    assert_eq!(report.center, ChunkCoord::new(-1, -2));
    assert_window_resident(&world, viewer, 1);
    // World (-1, 0, -17) lives in chunk (-1, -2) at local (15, 0, 15).
    assert_eq!(
        world.get_block_id(Point3::new(-1, 0, -17)),
        Ok(BlockType::BEDROCK)
    );
}

#[test]
fn test_background_generation_matches_synchronous() {
    let viewer = Point3::new(8.0, 64.0, 8.0);

    let mut sync_gpu = HeadlessBackend::new();
    let mut sync_world = World::new(42);
    sync_world.smart_rendering_preprocess(&mut sync_gpu, viewer, 2);

    let mut gpu = HeadlessBackend::new();
    let mut world = World::new(42).with_workers(2);

    let first = world.smart_rendering_preprocess(&mut gpu, viewer, 2);
    assert_eq!(first.created, 25);
    // Scheduled chunks are not readable until integrated.
    for coord in ChunkCoord::new(0, 0).window(2) {
        if world.is_pending(coord) {
            assert!(world.chunk(coord).is_none());
        }
    }

    world.wait_for_background();
    assert_eq!(world.pending_count(), 0);
    assert_eq!(world.chunk_count(), 25);

    let second = world.smart_rendering_preprocess(&mut gpu, viewer, 2);
    assert_eq!(second.created, 0);
    // Background chunks arrive already meshed.
    assert_eq!(second.meshed, 0);
    assert_window_resident(&world, viewer, 2);
    assert_eq!(world.visible_vertex_count(), sync_world.visible_vertex_count());

    for coord in ChunkCoord::new(0, 0).window(2) {
        let origin = coord.origin();
        for y in [0, 10, 20, 23, 30, 45, 70] {
            for (dx, dz) in [(0, 0), (7, 3), (15, 15)] {
                let block = Point3::new(origin.x + dx, y, origin.z + dz);
                assert_eq!(
                    world.get_block_id(block),
                    sync_world.get_block_id(block),
                    "{:?}",
                    block
                );
            }
        }
    }
}

#[test]
fn test_release_all_frees_gpu_memory() {
    let mut gpu = HeadlessBackend::new();
    let mut world = World::new(42);
    world.smart_rendering_preprocess(&mut gpu, Point3::new(0.0, 0.0, 0.0), 2);
    assert!(gpu.analytics().allocated_memory > 0);

    world.release_all(&mut gpu);

    assert_eq!(gpu.live_meshes(), 0);
    assert_eq!(gpu.analytics().allocated_memory, 0);
    assert!(world.residency().is_empty());
}
