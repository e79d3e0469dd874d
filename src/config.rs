//! Player configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. Nothing is ever written back.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::time::VOLUME_MAX;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "AGUDIE_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Base window title; the open file's name is appended to it.
    pub title: String,
    pub window_position: [f32; 2],
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    /// Volume slider value at startup (0-100)
    pub initial_volume: u8,
    /// How often playback position is polled while playing
    pub poll_interval_ms: u64,
    /// Extensions offered by the "Media Files" dialog filter
    pub media_extensions: Vec<String>,
    /// Where the open dialog starts. Defaults to the home directory.
    pub start_dir: Option<PathBuf>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            title: "Agudie Media Player".to_string(),
            window_position: [100.0, 100.0],
            window_size: [800.0, 600.0],
            min_window_size: [320.0, 240.0],
            initial_volume: 50,
            poll_interval_ms: 200,
            media_extensions: ["mp4", "avi", "mkv", "mov", "flv", "wmv"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            start_dir: dirs::home_dir(),
        }
    }
}

impl PlayerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `$AGUDIE_CONFIG` or `<config dir>/agudie/config.toml`.
    /// A missing file gives the defaults; a broken one is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("agudie").join("config.toml"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn sanitized(mut self) -> Self {
        self.initial_volume = self.initial_volume.min(VOLUME_MAX);
        self.poll_interval_ms = self.poll_interval_ms.max(10);
        self.media_extensions = self
            .media_extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }
}
