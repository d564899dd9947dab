//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use super::render::RenderSettings;
use crate::encode::EncoderKind;
use image::Rgba;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Tile source settings
    pub source: SourceSettings,
    /// Download settings
    pub download: DownloadSettings,
    /// Render settings
    pub render: RenderFileSettings,
    /// Output location settings
    pub output: OutputSettings,
    /// HTTP server settings
    pub server: ServerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Tile source configuration.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// URL template with {date}, {z}, {x}, {y} placeholders
    pub url_template: String,
    /// Zoom level tiles are fetched at
    pub zoom: u8,
}

/// Download configuration.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Timeout in seconds for each tile request.
    pub timeout: u64,
}

/// Render configuration as stored in the file.
#[derive(Debug, Clone)]
pub struct RenderFileSettings {
    /// Maximum batch edge length in tiles
    pub max_batch_dim: u32,
    /// Tile edge length in pixels
    pub tile_size: u32,
    /// Output frame rate
    pub fps: u32,
    /// Colour used for tiles that could not be fetched
    pub placeholder_color: Rgba<u8>,
    /// Maximum days per job
    pub max_days: u32,
    /// Maximum tiles per frame per job
    pub max_tiles: u64,
    /// Clip encoder backend
    pub encoder: EncoderKind,
    /// ffmpeg executable (only used when encoder = ffmpeg)
    pub ffmpeg_path: PathBuf,
}

/// Output locations.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// Directory finished animations are written to
    pub directory: PathBuf,
    /// Root for per-job temporary working trees
    pub work_dir: PathBuf,
    /// Public URL prefix artifacts are served under
    pub url_prefix: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Socket address to listen on
    pub bind: String,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Directory for log files
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}

impl ConfigFile {
    /// Derives the pipeline's render settings.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings::new()
            .with_tile_size(self.render.tile_size)
            .with_max_batch_dim(self.render.max_batch_dim)
            .with_fps(self.render.fps)
            .with_placeholder_color(self.render.placeholder_color)
            .with_request_timeout(Duration::from_secs(self.download.timeout))
            .with_max_days(self.render.max_days)
            .with_max_tiles(self.render.max_tiles)
    }
}
