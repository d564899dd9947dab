//! Default values and constants for all configuration settings.

use image::Rgba;
use std::path::PathBuf;

use super::settings::*;
use crate::encode::EncoderKind;

// =============================================================================
// Source
// =============================================================================

/// NASA GIBS MODIS Terra true-colour daily mosaic in Web Mercator.
pub const DEFAULT_URL_TEMPLATE: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/MODIS_Terra_CorrectedReflectance_TrueColor/default/{date}/GoogleMapsCompatible_Level9/{z}/{y}/{x}.jpg";

pub const DEFAULT_ZOOM: u8 = 6;

// =============================================================================
// Download / render
// =============================================================================

pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Batch edge length in tiles; bounds a frame to 16×16 tiles.
pub const DEFAULT_MAX_BATCH_DIM: u32 = 16;

pub const DEFAULT_FPS: u32 = 10;

pub const DEFAULT_PLACEHOLDER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

pub const DEFAULT_MAX_DAYS: u32 = 366;

/// 64×64 tiles per frame (16 batches at the default batch size).
pub const DEFAULT_MAX_TILES: u64 = 4096;

pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

// =============================================================================
// Output / server / logging
// =============================================================================

pub const DEFAULT_URL_PREFIX: &str = "/files";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

pub const DEFAULT_LOG_DIR: &str = "logs";

pub const DEFAULT_LOG_FILE: &str = "tilereel.log";

/// Default directory for finished animations.
pub fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tilereel").join("animations"))
        .unwrap_or_else(|| PathBuf::from("animations"))
}

/// Default root for per-job working directories.
pub fn default_work_dir() -> PathBuf {
    std::env::temp_dir()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            source: SourceSettings {
                url_template: DEFAULT_URL_TEMPLATE.to_string(),
                zoom: DEFAULT_ZOOM,
            },
            download: DownloadSettings {
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            },
            render: RenderFileSettings {
                max_batch_dim: DEFAULT_MAX_BATCH_DIM,
                tile_size: DEFAULT_TILE_SIZE,
                fps: DEFAULT_FPS,
                placeholder_color: DEFAULT_PLACEHOLDER_COLOR,
                max_days: DEFAULT_MAX_DAYS,
                max_tiles: DEFAULT_MAX_TILES,
                encoder: EncoderKind::Gif,
                ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            },
            output: OutputSettings {
                directory: default_output_dir(),
                work_dir: default_work_dir(),
                url_prefix: DEFAULT_URL_PREFIX.to_string(),
            },
            server: ServerSettings {
                bind: DEFAULT_BIND_ADDRESS.to_string(),
            },
            logging: LoggingSettings {
                directory: PathBuf::from(DEFAULT_LOG_DIR),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
