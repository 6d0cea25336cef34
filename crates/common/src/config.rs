//! Application configuration.
//!
//! Values here are defaults only; command-line flags override them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GridstackError, GridstackResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default layout settings.
    pub defaults: LayoutDefaults,

    /// Encoder settings for video output.
    pub encoding: EncodingDefaults,

    /// Kill ffmpeg after this many seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDefaults {
    /// Canvas background (`black`, `#202020`, `transparent`, ...).
    pub bg_color: String,

    /// File extensions picked up from an input directory.
    pub exts: Vec<String>,

    /// Fit mode name (`tight`, `contain`, `cover`).
    pub fit_mode: String,

    /// Row alignment name (`left`, `center`, `right`).
    pub align: String,

    /// Gutter between cells in pixels.
    pub gutter: u32,

    /// Frame rate used when neither the flag nor the probe yields one.
    pub fallback_fps: f64,
}

/// Video encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingDefaults {
    /// Constant rate factor for x264.
    pub crf: u32,

    /// x264 preset.
    pub preset: String,

    /// Audio bitrate when the first input's audio is kept.
    pub audio_bitrate_kbps: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "gridstack=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            bg_color: "black".to_string(),
            exts: ["jpg", "jpeg", "png", "webp", "bmp", "mp4", "mov", "mkv", "webm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fit_mode: "tight".to_string(),
            align: "center".to_string(),
            gutter: 0,
            fallback_fps: 30.0,
        }
    }
}

impl Default for EncodingDefaults {
    fn default() -> Self {
        Self {
            crf: 20,
            preset: "medium".to_string(),
            audio_bitrate_kbps: 192,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location.
    pub fn load() -> GridstackResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path. A missing file yields defaults;
    /// an unreadable or malformed one is an error.
    pub fn load_from(config_path: &Path) -> GridstackResult<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(config_path)?;
        serde_json::from_str(&content).map_err(|e| {
            GridstackError::invalid_config(format!(
                "failed to parse config at {}: {e}",
                config_path.display()
            ))
        })
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("gridstack").join("config.json")
}
