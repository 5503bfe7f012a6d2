//! # Engine State Module
//!
//! The core engine module that ties the voxel world to a GPU backend.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `buffer_state` - The GPU buffer primitive and its in-memory backend
//! * `rendering` - Vertex layout, meshing, and the `wgpu` backend
//! * `task_management` - Worker threads for background chunk generation
//! * `voxels` - Blocks, chunks, terrain, streaming and ray tracing
//!
//! ## Frame Structure
//!
//! Each frame the host moves the viewer, calls `EngineState::tick` to stream
//! chunks around it, then draws the render queue: every opaque stream first,
//! then every water stream. `EngineState::render` records and ends the frame in
//! one go. A host that owns a render pass calls `record_frame`, consumes the
//! draws through `gpu_mut`, then `end_frame`; with the `wgpu` backend
//! `EngineState::render_into` does all three.

use cgmath::{Point3, Vector3};
use log::{debug, info};

use buffer_state::{BufferAnalytics, GpuBackend};
use rendering::WgpuBackend;
use voxels::terrain::TerrainGenerator;
use voxels::{block::BlockType, BlockAccessError, BlockHit, SetOutcome, StreamingReport, World};

use crate::application_state::config::EngineConfig;

pub mod buffer_state;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// A block edit aimed along a ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockEdit {
    /// Replace the targeted block with air
    Break,
    /// Put a block in the cell in front of the targeted face
    Place(BlockType),
}

/// The main state container for the voxel engine
///
/// Owns the world and the GPU backend its chunks are uploaded to, along with the
/// viewer the streaming window follows.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use octacubic::application_state::config::EngineConfig;
/// use octacubic::engine_state::{buffer_state::HeadlessBackend, EngineState};
///
/// let config = EngineConfig { view_distance: 1, ..Default::default() };
/// let mut engine = EngineState::new(&config, HeadlessBackend::new());
///
/// engine.set_viewer(Point3::new(8.0, 40.0, 8.0));
/// let report = engine.tick();
/// assert_eq!(report.queued, 9);
///
/// engine.record_frame();
/// let recorded = engine.gpu_mut().take_draws();
/// assert!(recorded.len() >= 9);
/// assert_eq!(engine.end_frame(), recorded.len());
/// ```
pub struct EngineState<B: GpuBackend> {
    /// The voxel world containing all chunk data
    world: World,
    /// Backend every mesh is uploaded to and drawn from
    gpu: B,
    /// Position the streaming window is centred on
    viewer: Point3<f32>,
    /// Streaming radius in chunks
    view_distance: u32,
    /// Frames rendered so far
    frame: u64,
}

impl<B: GpuBackend> EngineState<B> {
    /// Creates an engine for `config`, drawing through `gpu`.
    pub fn new(config: &EngineConfig, gpu: B) -> Self {
        let seed = config.resolve_seed();
        let world = World::with_generator(TerrainGenerator::new(seed, config.sea_level))
            .with_workers(config.worker_threads);

        Self {
            world,
            gpu,
            viewer: Point3::from(config.viewer_path.start),
            view_distance: config.view_distance,
            frame: 0,
        }
    }

    /// The voxel world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The voxel world, for direct edits.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Current viewer position.
    pub fn viewer(&self) -> Point3<f32> {
        self.viewer
    }

    /// Moves the viewer. Takes effect on the next `tick`.
    pub fn set_viewer(&mut self, viewer: Point3<f32>) {
        self.viewer = viewer;
    }

    /// Streaming radius in chunks.
    pub fn view_distance(&self) -> u32 {
        self.view_distance
    }

    /// Changes the streaming radius. Takes effect on the next `tick`.
    pub fn set_view_distance(&mut self, view_distance: u32) {
        self.view_distance = view_distance;
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The GPU backend.
    pub fn gpu(&self) -> &B {
        &self.gpu
    }

    /// The GPU backend, for consuming the draws of the current frame.
    pub fn gpu_mut(&mut self) -> &mut B {
        &mut self.gpu
    }

    /// Memory statistics of the GPU backend.
    pub fn analytics(&self) -> BufferAnalytics {
        self.gpu.analytics()
    }

    /// Streams chunks around the viewer and rebuilds the render queue.
    pub fn tick(&mut self) -> StreamingReport {
        self.world
            .smart_rendering_preprocess(&mut self.gpu, self.viewer, self.view_distance)
    }

    /// Records the draws of the render queue on the backend, opaque streams
    /// before water streams. They stay on the backend until consumed or until
    /// `end_frame`.
    pub fn record_frame(&mut self) {
        self.world.render_in_queue_opaque(&mut self.gpu);
        self.world.render_in_queue_water(&mut self.gpu);
    }

    /// Ends the frame, discarding draws nobody consumed. Returns the number of
    /// draws the frame recorded.
    pub fn end_frame(&mut self) -> usize {
        self.frame += 1;

        let draws = self.gpu.finish_frame();
        debug!("Frame {}: {} draws", self.frame, draws);
        draws
    }

    /// Records the render queue and ends the frame straight away.
    pub fn render(&mut self) -> usize {
        self.record_frame();
        self.end_frame()
    }

    /// Applies `edit` to the first block face hit by the ray from `origin` along
    /// `direction`, within `reach` direction units.
    ///
    /// Returns `Ok(None)` if the ray hits nothing. The edited chunk is re-meshed
    /// and re-uploaded on the next `tick`.
    pub fn apply_edit(
        &mut self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        reach: f32,
        edit: BlockEdit,
    ) -> Result<Option<(BlockHit, SetOutcome)>, BlockAccessError> {
        let Some(hit) = self.world.line_trace_to_face(origin, direction, reach) else {
            return Ok(None);
        };

        let outcome = match edit {
            BlockEdit::Break => self.world.break_block(&hit)?,
            BlockEdit::Place(block) => self.world.place_block(&hit, block)?,
        };
        debug!("{:?} at {:?} ({:?}): {:?}", edit, hit.block, hit.face, outcome);

        Ok(Some((hit, outcome)))
    }

    /// Waits for background generation and frees every GPU buffer the world holds.
    pub fn shutdown(&mut self) {
        self.world.wait_for_background();
        self.world.release_all(&mut self.gpu);

        let analytics = self.gpu.analytics();
        info!(
            "Shut down after {} frames: {} chunks generated, peak GPU memory {} bytes, {} bytes still allocated",
            self.frame,
            self.world.chunk_count(),
            analytics.peak_memory,
            analytics.allocated_memory
        );
    }
}

impl EngineState<WgpuBackend> {
    /// Records the render queue, replays it into `render_pass` and ends the
    /// frame. The pass must already have a pipeline and bind groups set.
    pub fn render_into(&mut self, render_pass: &mut wgpu::RenderPass<'_>) -> usize {
        self.record_frame();
        self.gpu.replay(render_pass);
        self.end_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::buffer_state::HeadlessBackend;

    fn engine(view_distance: u32) -> EngineState<HeadlessBackend> {
        let config = EngineConfig {
            seed: Some(42),
            view_distance,
            ..Default::default()
        };
        EngineState::new(&config, HeadlessBackend::new())
    }

    #[test]
    fn test_tick_then_render() {
        let mut engine = engine(1);
        engine.set_viewer(Point3::new(0.0, 40.0, 0.0));

        let report = engine.tick();
        let draws = engine.render();

        assert_eq!(report.queued, 9);
        // One opaque draw per queued chunk plus any water draws.
        assert!((9..=18).contains(&draws));
        assert_eq!(engine.frame(), 1);
        assert_eq!(engine.analytics().live_meshes as usize, draws);
    }

    #[test]
    fn test_recorded_draws_survive_until_consumed() {
        let mut engine = engine(1);
        engine.set_viewer(Point3::new(0.0, 40.0, 0.0));
        engine.tick();

        engine.record_frame();
        let pending = engine.gpu().draws().len();
        assert!(pending >= 9);
        assert_eq!(engine.frame(), 0);

        // The host consumes the draws before the frame ends.
        let consumed = engine.gpu_mut().take_draws();
        assert_eq!(consumed.len(), pending);
        let live: Vec<_> = consumed
            .iter()
            .filter(|draw| engine.gpu().is_live(draw.handle))
            .collect();
        assert_eq!(live.len(), pending);

        assert_eq!(engine.end_frame(), pending);
        assert_eq!(engine.frame(), 1);
        assert!(engine.gpu().draws().is_empty());
    }

    #[test]
    fn test_unconsumed_draws_are_dropped_at_frame_end() {
        let mut engine = engine(1);
        engine.tick();

        engine.record_frame();
        let recorded = engine.gpu().draws().len();
        assert_eq!(engine.end_frame(), recorded);
        assert!(engine.gpu().draws().is_empty());

        // Nothing carries over into the next frame.
        assert_eq!(engine.end_frame(), 0);
    }

    #[test]
    fn test_break_then_place_through_edit() {
        let mut engine = engine(0);
        engine.set_viewer(Point3::new(0.5, 200.0, 0.5));
        engine.tick();

        let down = Vector3::new(0.0, -1.0, 0.0);
        let origin = Point3::new(0.5, 200.0, 0.5);

        let (hit, outcome) = engine
            .apply_edit(origin, down, 256.0, BlockEdit::Break)
            .unwrap()
            .expect("column has a surface");
        assert_eq!(hit.face, voxels::block::BlockSide::TOP);
        assert!(outcome.is_changed());
        assert_eq!(engine.world().get_block_id(hit.block), Ok(BlockType::AIR));

        let (placed, _) = engine
            .apply_edit(origin, down, 256.0, BlockEdit::Place(BlockType::SAND))
            .unwrap()
            .expect("column still has a surface");
        assert_eq!(
            engine.world().get_block_id(placed.adjacent()),
            Ok(BlockType::SAND)
        );

        let report = engine.tick();
        assert_eq!(report.meshed, 1);
        assert_eq!(report.uploaded, 1);
    }

    #[test]
    fn test_miss_is_not_an_error() {
        let mut engine = engine(0);
        engine.tick();

        let up = Vector3::new(0.0, 1.0, 0.0);
        let result = engine.apply_edit(Point3::new(0.5, 250.0, 0.5), up, 100.0, BlockEdit::Break);
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_shutdown_frees_everything() {
        let mut engine = engine(1);
        engine.tick();
        assert!(engine.analytics().allocated_memory > 0);

        engine.shutdown();

        assert_eq!(engine.analytics().allocated_memory, 0);
        assert_eq!(engine.world().num_chunks_in_gpu(), 0);
    }
}
