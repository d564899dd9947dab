//! Render pipeline configuration.

use super::defaults::{
    DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_FPS, DEFAULT_MAX_BATCH_DIM, DEFAULT_MAX_DAYS,
    DEFAULT_MAX_TILES, DEFAULT_PLACEHOLDER_COLOR, DEFAULT_TILE_SIZE,
};
use image::Rgba;
use std::time::Duration;

/// Settings consumed by the tile-to-animation pipeline.
///
/// Fixed for the lifetime of a service; jobs cannot override them.
///
/// # Example
///
/// ```
/// use tilereel::config::RenderSettings;
///
/// let settings = RenderSettings::default()
///     .with_max_batch_dim(8)
///     .with_fps(5);
/// assert_eq!(settings.max_batch_dim(), 8);
/// assert_eq!(settings.tile_size(), 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// Edge length of every tile in pixels
    tile_size: u32,
    /// Maximum batch edge length in tiles
    max_batch_dim: u32,
    /// Output frame rate
    fps: u32,
    /// Colour of synthesized tiles
    placeholder_color: Rgba<u8>,
    /// Per-tile request deadline
    request_timeout: Duration,
    /// Upper bound on the number of days in one job
    max_days: u32,
    /// Upper bound on the number of tiles per frame in one job
    max_tiles: u64,
}

impl RenderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    /// Set the batch edge length in tiles. Values below 1 become 1.
    pub fn with_max_batch_dim(mut self, dim: u32) -> Self {
        self.max_batch_dim = dim.max(1);
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn with_placeholder_color(mut self, color: Rgba<u8>) -> Self {
        self.placeholder_color = color;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = max_days.max(1);
        self
    }

    pub fn with_max_tiles(mut self, max_tiles: u64) -> Self {
        self.max_tiles = max_tiles.max(1);
        self
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[inline]
    pub fn max_batch_dim(&self) -> u32 {
        self.max_batch_dim
    }

    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    #[inline]
    pub fn placeholder_color(&self) -> Rgba<u8> {
        self.placeholder_color
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[inline]
    pub fn max_days(&self) -> u32 {
        self.max_days
    }

    #[inline]
    pub fn max_tiles(&self) -> u64 {
        self.max_tiles
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            max_batch_dim: DEFAULT_MAX_BATCH_DIM,
            fps: DEFAULT_FPS,
            placeholder_color: DEFAULT_PLACEHOLDER_COLOR,
            request_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            max_days: DEFAULT_MAX_DAYS,
            max_tiles: DEFAULT_MAX_TILES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RenderSettings::default();
        assert_eq!(settings.tile_size(), 512);
        assert_eq!(settings.max_batch_dim(), 16);
        assert_eq!(settings.fps(), 10);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.placeholder_color(), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_zero_values_are_raised_to_one() {
        let settings = RenderSettings::new()
            .with_max_batch_dim(0)
            .with_fps(0)
            .with_tile_size(0);
        assert_eq!(settings.max_batch_dim(), 1);
        assert_eq!(settings.fps(), 1);
        assert_eq!(settings.tile_size(), 1);
    }

    #[test]
    fn test_builder_leaves_other_fields() {
        let settings = RenderSettings::new().with_fps(24);
        assert_eq!(settings.fps(), 24);
        assert_eq!(settings.max_batch_dim(), DEFAULT_MAX_BATCH_DIM);
    }
}
