//! # Application State Management
//!
//! This module drives the engine without a window:
//! - Configuration loading (`config`)
//! - GPU backend selection, with a fallback to the in-memory backend
//! - The frame loop: move the viewer, stream, draw, and periodically edit blocks

pub mod config;

use cgmath::{Point3, Vector3};
use log::{error, info, warn};
use web_time::Instant;

use config::EngineConfig;

use crate::engine_state::voxels::block::BlockType;
use crate::engine_state::{
    buffer_state::{GpuBackend, HeadlessBackend},
    rendering::{OffscreenTarget, WgpuBackend},
    BlockEdit, EngineState,
};

/// Size of the offscreen target frames are rendered into on a real device.
pub const OFFSCREEN_SIZE: (u32, u32) = (640, 360);

/// Totals from one headless run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames simulated
    pub frames: u32,
    /// Chunks that exist at the end of the run
    pub chunks: usize,
    /// Draw calls issued across all frames
    pub draws: u64,
    /// Block edits that changed the world
    pub edits: u32,
    /// Highest GPU memory use, in bytes
    pub peak_memory: u64,
}

/// Runs `config.frames` frames with the viewer moving along `config.viewer_path`.
///
/// A `wgpu` device is only requested when `use_wgpu` is set. Frames are then
/// rendered into an offscreen target; if no device can be created the
/// in-memory backend is used instead.
pub fn run_headless(config: &EngineConfig) -> RunSummary {
    if config.use_wgpu {
        match WgpuBackend::request_headless() {
            Ok(backend) => {
                let (width, height) = OFFSCREEN_SIZE;
                let target = OffscreenTarget::new(backend.device(), width, height);
                let look = Vector3::from(config.viewer_path.look);
                let engine = EngineState::new(config, backend);
                return run_frames(config, engine, |engine| target.draw_frame(engine, look));
            }
            Err(e) => error!("Falling back to the headless backend: {}", e),
        }
    }

    let engine = EngineState::new(config, HeadlessBackend::new());
    run_frames(config, engine, EngineState::render)
}

/// The frame loop shared by every backend. `render` draws one frame and
/// returns its draw count.
fn run_frames<B, R>(config: &EngineConfig, mut engine: EngineState<B>, mut render: R) -> RunSummary
where
    B: GpuBackend,
    R: FnMut(&mut EngineState<B>) -> usize,
{
    let start = Instant::now();
    let mut summary = RunSummary::default();

    let velocity = Vector3::from(config.viewer_path.velocity);
    let look = Vector3::from(config.viewer_path.look);
    let mut viewer = Point3::from(config.viewer_path.start);

    for frame in 0..config.frames {
        engine.set_viewer(viewer);
        engine.tick();
        summary.draws += render(&mut engine) as u64;

        if config.edit_interval > 0 && (frame + 1) % config.edit_interval == 0 {
            // Alternate between digging and building.
            let edit = if summary.edits % 2 == 0 {
                BlockEdit::Break
            } else {
                BlockEdit::Place(BlockType::STONE)
            };
            match engine.apply_edit(viewer, look, config.reach, edit) {
                Ok(Some((_, outcome))) if outcome.is_changed() => summary.edits += 1,
                Ok(_) => {}
                Err(e) => warn!("Edit failed: {}", e),
            }
        }

        viewer += velocity;
        summary.frames += 1;
    }

    engine.shutdown();

    summary.chunks = engine.world().chunk_count();
    summary.peak_memory = engine.analytics().peak_memory;
    info!(
        "Ran {} frames in {:?}: {} draws, {} edits, {} chunks",
        summary.frames,
        start.elapsed(),
        summary.draws,
        summary.edits,
        summary.chunks
    );

    summary
}
