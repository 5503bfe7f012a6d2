//! # Engine Configuration
//!
//! Runtime settings, read from a JSON file. Every field has a default, so a file
//! only needs the values it changes:
//!
//! ```json
//! { "seed": 7, "view_distance": 4, "worker_threads": 2 }
//! ```
//!
//! The file is located through the `OCTACUBIC_CONFIG` environment variable.
//! Without a `seed` every launch generates a different world.
//! Chunk dimensions and block ids are compile-time constants and not configurable.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine_state::voxels::terrain::DEFAULT_SEA_LEVEL;

/// Environment variable holding the path of the configuration file.
pub const CONFIG_ENV_VAR: &str = "OCTACUBIC_CONFIG";

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid configuration JSON.
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Straight-line viewer motion used by the headless driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerPath {
    /// Viewer position on the first frame
    pub start: [f32; 3],
    /// Displacement per frame
    pub velocity: [f32; 3],
    /// Look direction, used for block targeting
    pub look: [f32; 3],
}

impl Default for ViewerPath {
    fn default() -> Self {
        Self {
            start: [8.0, 80.0, 8.0],
            velocity: [4.0, 0.0, 0.0],
            look: [0.0, -1.0, 0.0],
        }
    }
}

/// Settings for one engine run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Terrain seed; a random one is drawn per launch when absent
    pub seed: Option<u32>,
    /// Sea-level altitude
    pub sea_level: i32,
    /// Streaming radius, in chunks (Chebyshev distance)
    pub view_distance: u32,
    /// Background generation threads; 0 generates synchronously on the tick thread
    pub worker_threads: usize,
    /// Frames simulated by the headless driver
    pub frames: u32,
    /// Viewer motion for the headless driver
    pub viewer_path: ViewerPath,
    /// Break the targeted block every this many frames (0 never)
    pub edit_interval: u32,
    /// Reach of block targeting, in blocks
    pub reach: f32,
    /// Try to upload meshes to a real `wgpu` device
    pub use_wgpu: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            sea_level: DEFAULT_SEA_LEVEL,
            view_distance: 10,
            worker_threads: 0,
            frames: 60,
            viewer_path: ViewerPath::default(),
            edit_interval: 0,
            reach: 64.0,
            use_wgpu: false,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The configured seed, or a freshly drawn random one.
    pub fn resolve_seed(&self) -> u32 {
        match self.seed {
            Some(seed) => {
                info!("Using configured seed {}", seed);
                seed
            }
            None => {
                let seed = fastrand::u32(..);
                info!("No seed configured, using random seed {}", seed);
                seed
            }
        }
    }

    /// Loads the file named by `OCTACUBIC_CONFIG`, or returns the defaults if the
    /// variable is unset or the file is unusable.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV_VAR) else {
            info!("{} not set, using default configuration", CONFIG_ENV_VAR);
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path);
                config
            }
            Err(error) => {
                warn!("Ignoring configuration {}: {}", path, error);
                Self::default()
            }
        }
    }
}
