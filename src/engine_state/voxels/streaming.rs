//! # Chunk Streaming
//!
//! Decides, once per tick, which chunks must exist, be meshed, be on the GPU, or
//! be evicted, based on the viewer position and view distance.
//!
//! Per coordinate the implicit state machine is
//!
//! ```text
//! Absent -> Generated (dirty) -> Meshed -> Resident -> Evicted (data kept)
//!                   ^--------- any value-changing edit ---------'
//! ```
//!
//! After `smart_rendering_preprocess` returns, every chunk in the render queue is
//! non-dirty and resident.

use cgmath::Point3;
use log::{debug, info};
use web_time::Instant;

use super::coords::ChunkCoord;
use super::tasks::ChunkGenerationTask;
use super::world::World;
use crate::engine_state::buffer_state::GpuBackend;

/// What one streaming pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingReport {
    /// Chunk at the centre of the window
    pub center: ChunkCoord,
    /// Chunks whose GPU buffers were freed
    pub evicted: usize,
    /// Chunks created (or handed to a background task)
    pub created: usize,
    /// Chunks re-meshed because they were dirty
    pub meshed: usize,
    /// Chunks uploaded because they were not resident
    pub uploaded: usize,
    /// Chunks in the render queue
    pub queued: usize,
    /// Vertices across the render queue
    pub visible_vertices: u64,
}

impl World {
    /// Brings the chunks around `viewer_pos` into a drawable state and rebuilds
    /// the render queue.
    ///
    /// 1. The window is every chunk within Chebyshev distance `view_distance` of
    ///    the chunk containing the viewer.
    /// 2. Resident chunks outside the window have their GPU buffers freed.
    /// 3. Window chunks that do not exist are created, bound and generated (or,
    ///    with background workers, scheduled and skipped until integrated).
    /// 4. Every existing window chunk is re-meshed if dirty, uploaded if not
    ///    resident, and appended to the render queue.
    pub fn smart_rendering_preprocess(
        &mut self,
        gpu: &mut dyn GpuBackend,
        viewer_pos: Point3<f32>,
        view_distance: u32,
    ) -> StreamingReport {
        let start = Instant::now();
        self.integrate_background_results();

        let center = ChunkCoord::from_position(viewer_pos);
        let mut report = StreamingReport {
            center,
            ..Default::default()
        };

        for coord in self.residency.snapshot() {
            if coord.chebyshev_distance(center) <= view_distance {
                continue;
            }
            match self.chunks.get_mut(&coord) {
                Some(chunk) => chunk.free_gpu(gpu),
                None => self.residency.remove(coord),
            }
            report.evicted += 1;
        }

        for coord in center.window(view_distance) {
            if self.chunks.contains_key(&coord) || self.pending.contains(&coord) {
                continue;
            }
            match self.task_manager.as_mut() {
                Some(task_manager) => {
                    task_manager.publish_task(Box::new(ChunkGenerationTask::new(
                        self.generator.clone(),
                        coord,
                    )));
                    self.pending.insert(coord);
                }
                None => {
                    self.load_chunk(coord);
                }
            }
            report.created += 1;
        }

        self.render_queue.clear();
        self.visible_vertices = 0;
        for coord in center.window(view_distance) {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            if chunk.is_dirty() {
                chunk.build_mesh();
                report.meshed += 1;
            }
            if !chunk.is_in_gpu() {
                chunk.send_to_gpu(gpu);
                report.uploaded += 1;
            }
            self.visible_vertices += chunk.num_vertices() as u64;
            self.render_queue.push(coord);
        }

        report.queued = self.render_queue.len();
        report.visible_vertices = self.visible_vertices;

        if report.created + report.evicted + report.uploaded > 0 {
            info!(
                "Streaming around {}: {} queued, {} resident, {} visible vertices, {} created, {} evicted, {} uploaded in {:?}",
                center,
                report.queued,
                self.residency.len(),
                report.visible_vertices,
                report.created,
                report.evicted,
                report.uploaded,
                start.elapsed()
            );
        } else {
            debug!(
                "Streaming around {}: {} queued, nothing to do",
                center, report.queued
            );
        }

        report
    }

    /// Draws the opaque stream of every queued chunk, in queue order.
    pub fn render_in_queue_opaque(&self, gpu: &mut dyn GpuBackend) {
        for coord in &self.render_queue {
            if let Some(chunk) = self.chunks.get(coord) {
                chunk.render_opaque(gpu);
            }
        }
    }

    /// Draws the water stream of every queued chunk, in queue order. Call after
    /// `render_in_queue_opaque`.
    pub fn render_in_queue_water(&self, gpu: &mut dyn GpuBackend) {
        for coord in &self.render_queue {
            if let Some(chunk) = self.chunks.get(coord) {
                chunk.render_water(gpu);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::buffer_state::HeadlessBackend;
    use crate::engine_state::voxels::block::BlockType;

    fn assert_queue_ready(world: &World) {
        for coord in world.render_queue() {
            let chunk = world.chunk(*coord).expect("queued chunk exists");
            assert!(!chunk.is_dirty(), "{} is dirty", coord);
            assert!(chunk.is_in_gpu(), "{} is not resident", coord);
        }
    }

    #[test]
    fn test_window_is_materialized_and_queued() {
        let mut gpu = HeadlessBackend::new();
        let mut world = World::new(42);

        let report = world.smart_rendering_preprocess(&mut gpu, Point3::new(8.0, 40.0, 8.0), 1);

        assert_eq!(report.created, 9);
        assert_eq!(report.queued, 9);
        assert_eq!(world.chunk_count(), 9);
        assert_eq!(world.num_chunks_in_gpu(), 9);
        assert_eq!(world.render_queue()[0], ChunkCoord::new(-1, -1));
        assert_eq!(world.render_queue()[8], ChunkCoord::new(1, 1));
        assert!(world.visible_vertex_count() > 0);
        assert_queue_ready(&world);
    }

    #[test]
    fn test_second_pass_is_idle() {
        let mut gpu = HeadlessBackend::new();
        let mut world = World::new(42);
        world.smart_rendering_preprocess(&mut gpu, Point3::new(0.0, 0.0, 0.0), 1);
        let uploads = gpu.uploads();

        let report = world.smart_rendering_preprocess(&mut gpu, Point3::new(1.0, 0.0, 1.0), 1);

        assert_eq!(report.created + report.meshed + report.uploaded + report.evicted, 0);
        assert_eq!(gpu.uploads(), uploads);
    }

    #[test]
    fn test_edit_is_remeshed_and_reuploaded() {
        let mut gpu = HeadlessBackend::new();
        let mut world = World::new(42);
        world.smart_rendering_preprocess(&mut gpu, Point3::new(0.0, 0.0, 0.0), 0);

        world
            .set_block_id(Point3::new(5, 200, 5), BlockType::STONE)
            .unwrap();
        let before = world.visible_vertex_count();
        let report = world.smart_rendering_preprocess(&mut gpu, Point3::new(0.0, 0.0, 0.0), 0);

        assert_eq!(report.meshed, 1);
        assert_eq!(report.uploaded, 1);
        assert_eq!(world.visible_vertex_count(), before + 24);
        assert_queue_ready(&world);
    }

    #[test]
    fn test_render_draws_opaque_then_water_in_queue_order() {
        let mut gpu = HeadlessBackend::new();
        let mut world = World::new(42);
        world.smart_rendering_preprocess(&mut gpu, Point3::new(0.0, 0.0, 0.0), 1);

        world.render_in_queue_opaque(&mut gpu);
        let opaque = gpu.take_draws();
        world.render_in_queue_water(&mut gpu);
        let water = gpu.take_draws();

        // Every generated chunk has bedrock, so every queued chunk draws opaque.
        assert_eq!(opaque.len(), world.render_queue().len());
        assert!(opaque.iter().all(|draw| draw.index_count > 0));
        assert!(water.len() <= world.render_queue().len());
    }
}
