//! Console configuration
//!
//! Loaded from a RON file; every field has a default so a partial file (or
//! no file at all) is valid.
//!
//! ```ron
//! (
//!     asset_dir: "assets",
//!     window_scale: 4,
//!     start_level: 0,
//!     resume: true,
//!     rng_seed: Some(42),
//!     log_filter: "peak_8=debug",
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;

/// Config file looked up when no path is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "peak8.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Directory holding sprites.png, font.png, map.txt, sprite_flags.txt
    pub asset_dir: PathBuf,
    /// Integer scale of the 128x128 screen in the window
    pub window_scale: u32,
    /// Entity pool slots
    pub pool_capacity: usize,
    /// Level to start on when nothing is resumed
    pub start_level: u32,
    /// Start from the level stored in save slot 0
    pub resume: bool,
    /// Fixed RNG seed; `None` seeds from entropy
    pub rng_seed: Option<u64>,
    /// Unused frame budget below which an overrun is reported
    pub overrun_threshold_ms: f64,
    /// `tracing` filter directive, overridden by RUST_LOG
    pub log_filter: String,
    /// Save file; `None` uses the platform data directory
    pub save_path: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            window_scale: 4,
            pool_capacity: 1000,
            start_level: 0,
            resume: true,
            rng_seed: None,
            overrun_threshold_ms: 1.0,
            log_filter: "info".to_string(),
            save_path: None,
        }
    }
}

impl ConsoleConfig {
    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConsoleError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    /// Where the save store lives.
    pub fn resolved_save_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.save_path {
            return Some(path.clone());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            dirs::data_dir().map(|d| d.join("peak-8").join("save.ron"))
        }
        #[cfg(target_arch = "wasm32")]
        {
            None
        }
    }
}
