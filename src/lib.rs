#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Octacubic
//!
//! The world core of a block-based voxel engine: chunked terrain, face-culled
//! meshing, GPU residency streaming around a moving viewer, and ray tracing for
//! block targeting.
//!
//! ## Key Modules
//!
//! * `application_state` - Configuration and the headless frame loop
//! * `core` - Shared-ownership resource wrapper used across the engine
//! * `engine_state` - The world, meshing, GPU backends, and task management
//!
//! ## Architecture
//!
//! * The world is an unbounded plane of 16x256x16 chunks, generated on demand
//! * Each chunk is meshed into an opaque stream and a water stream
//! * Meshes are uploaded through the `GpuBackend` trait, which has an in-memory
//!   implementation and a `wgpu` implementation
//! * Chunk generation can run on worker threads and be integrated on the next tick
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     octacubic::run();
//! }
//! ```
//!
//! Set `RUST_LOG` to choose the log level and `OCTACUBIC_CONFIG` to point at a
//! JSON configuration file.

use log::info;

use application_state::config::EngineConfig;

pub mod application_state;
pub mod core;
pub mod engine_state;

/// Initializes logging, loads the configuration and runs the headless frame loop.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = EngineConfig::from_env();
    application_state::run_headless(&config);
}
