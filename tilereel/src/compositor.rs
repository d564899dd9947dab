//! Per-day frame composition.
//!
//! For one batch and one day, every tile is fetched concurrently and the
//! results are pasted into a single canvas once all fetches have settled.
//! Tiles are read back from disk one at a time, so memory holds the canvas
//! plus a single tile.

use crate::batch::Batch;
use crate::dates::format_date;
use crate::fetch::{placeholder_tile, FetchedTile, TileFetcher};
use crate::provider::AsyncHttpClient;
use chrono::NaiveDate;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Fetch outcome counts for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub fetched: usize,
    pub placeholders: usize,
}

impl FetchSummary {
    pub fn total(&self) -> usize {
        self.fetched + self.placeholders
    }
}

/// One composited frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub date: NaiveDate,
    pub image: RgbaImage,
    pub summary: FetchSummary,
}

/// Infrastructure failures while composing a frame.
///
/// Tile failures never surface here; they become placeholders.
#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("Failed to prepare tile directory {path}: {source}")]
    TileDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Composite task failed: {0}")]
    TaskFailed(String),
}

/// Builds one frame per (batch, day) from fetched tiles.
pub struct FrameCompositor<C> {
    fetcher: Arc<TileFetcher<C>>,
    tile_size: u32,
    placeholder_color: Rgba<u8>,
}

impl<C: AsyncHttpClient> FrameCompositor<C> {
    pub fn new(fetcher: Arc<TileFetcher<C>>, placeholder_color: Rgba<u8>) -> Self {
        let tile_size = fetcher.tile_size();
        Self {
            fetcher,
            tile_size,
            placeholder_color,
        }
    }

    /// Fetches every tile of `batch` for `date` and composites the frame.
    ///
    /// Tiles are staged under `<tiles_dir>/<YYYY-MM-DD>/`, which is removed
    /// once the frame is built. The frame is exactly
    /// `batch.width() × tile_size` by `batch.height() × tile_size` pixels.
    pub async fn compose(
        &self,
        batch: &Batch,
        date: NaiveDate,
        tiles_dir: &Path,
    ) -> Result<Frame, CompositeError> {
        let date_dir = tiles_dir.join(format_date(date));
        tokio::fs::create_dir_all(&date_dir)
            .await
            .map_err(|source| CompositeError::TileDirectory {
                path: date_dir.display().to_string(),
                source,
            })?;

        // Fan out one fetch per tile, then wait for all of them.
        let mut fetches = JoinSet::new();
        for tile in batch.tiles() {
            let fetcher = Arc::clone(&self.fetcher);
            let dir = date_dir.clone();
            fetches.spawn(async move { fetcher.fetch(date, tile, &dir).await });
        }

        let mut fetched: HashMap<(u32, u32), FetchedTile> = HashMap::with_capacity(batch.tile_count());
        while let Some(result) = fetches.join_next().await {
            match result {
                Ok(tile) => {
                    fetched.insert((tile.tile.x, tile.tile.y), tile);
                }
                Err(e) => warn!(error = %e, "Tile fetch task failed, tile will be a placeholder"),
            }
        }

        let real = fetched.values().filter(|t| !t.placeholder).count();
        let summary = FetchSummary {
            fetched: real,
            placeholders: batch.tile_count() - real,
        };

        let batch_owned = batch.clone();
        let tile_size = self.tile_size;
        let color = self.placeholder_color;
        let image = tokio::task::spawn_blocking(move || {
            composite(&batch_owned, &fetched, tile_size, color)
        })
        .await
        .map_err(|e| CompositeError::TaskFailed(e.to_string()))?;

        if let Err(e) = tokio::fs::remove_dir_all(&date_dir).await {
            warn!(dir = %date_dir.display(), error = %e, "Failed to remove tile directory");
        }

        debug!(
            batch = %batch.label(),
            %date,
            fetched = summary.fetched,
            placeholders = summary.placeholders,
            "Frame composited"
        );

        Ok(Frame {
            date,
            image,
            summary,
        })
    }
}

/// Pastes every tile of `batch` at its grid offset.
///
/// Tiles missing from `fetched`, or whose file cannot be read back, are
/// drawn as placeholders.
fn composite(
    batch: &Batch,
    fetched: &HashMap<(u32, u32), FetchedTile>,
    tile_size: u32,
    color: Rgba<u8>,
) -> RgbaImage {
    let (width, height) = batch.frame_dimensions(tile_size);
    let mut canvas = RgbaImage::from_pixel(width, height, color);

    for tile in batch.tiles() {
        let Some(path) = fetched.get(&(tile.x, tile.y)).and_then(|t| t.path.as_ref()) else {
            continue;
        };

        let image = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Stored tile unreadable, using placeholder");
                placeholder_tile(tile_size, color)
            }
        };

        let (x, y) = batch.pixel_offset(&tile, tile_size);
        image::imageops::replace(&mut canvas, &image, x as i64, y as i64);
    }

    canvas
}
