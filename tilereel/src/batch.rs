//! Batch planning.
//!
//! Splits a tile rectangle into a row-major grid of sub-rectangles no larger
//! than `max_dim × max_dim` tiles. Each batch is rendered to its own clip so
//! memory and disk usage stay bounded by the batch size, not the job size.

use crate::coord::{TileCoord, TileRectangle};
use std::ops::Range;

/// One sub-rectangle of the job's tile rectangle.
///
/// Ranges are absolute tile indices, half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Batch row, 0 at the northern edge
    pub row: u32,
    /// Batch column, 0 at the western edge
    pub col: u32,
    pub x_range: Range<u32>,
    pub y_range: Range<u32>,
    pub zoom: u8,
}

impl Batch {
    /// Width in tiles.
    #[inline]
    pub fn width(&self) -> u32 {
        self.x_range.end - self.x_range.start
    }

    /// Height in tiles.
    #[inline]
    pub fn height(&self) -> u32 {
        self.y_range.end - self.y_range.start
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let zoom = self.zoom;
        self.y_range.clone().flat_map(move |y| {
            self.x_range.clone().map(move |x| TileCoord { x, y, zoom })
        })
    }

    /// Pixel offset of `tile` within this batch's frame.
    pub fn pixel_offset(&self, tile: &TileCoord, tile_size: u32) -> (u32, u32) {
        (
            (tile.x - self.x_range.start) * tile_size,
            (tile.y - self.y_range.start) * tile_size,
        )
    }

    /// Frame dimensions in pixels.
    pub fn frame_dimensions(&self, tile_size: u32) -> (u32, u32) {
        (self.width() * tile_size, self.height() * tile_size)
    }

    /// Stable directory/file stem, e.g. `batch_0_2`.
    pub fn label(&self) -> String {
        format!("batch_{}_{}", self.row, self.col)
    }
}

/// Row-major grid of batches covering a rectangle exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGrid {
    rows: u32,
    cols: u32,
    max_dim: u32,
    batches: Vec<Batch>,
}

impl BatchGrid {
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn max_dim(&self) -> u32 {
        self.max_dim
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&Batch> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.batches.get((row * self.cols + col) as usize)
    }
}

/// Partitions `rect` into batches of at most `max_dim × max_dim` tiles.
///
/// Batch `(r, c)` covers relative columns `[c·N, min(c·N+N, width))` and
/// rows `[r·N, min(r·N+N, height))`. Edge batches may be narrower or
/// shorter. A `max_dim` of zero is treated as one.
pub fn plan_batches(rect: &TileRectangle, max_dim: u32) -> BatchGrid {
    let n = max_dim.max(1);
    let width = rect.width();
    let height = rect.height();
    let cols = width.div_ceil(n);
    let rows = height.div_ceil(n);
    let origin_x = rect.top_left.x;
    let origin_y = rect.top_left.y;
    let zoom = rect.zoom();

    let mut batches = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        let y_start = row * n;
        let y_end = (y_start + n).min(height);
        for col in 0..cols {
            let x_start = col * n;
            let x_end = (x_start + n).min(width);
            batches.push(Batch {
                row,
                col,
                x_range: origin_x + x_start..origin_x + x_end,
                y_range: origin_y + y_start..origin_y + y_end,
                zoom,
            });
        }
    }

    BatchGrid {
        rows,
        cols,
        max_dim: n,
        batches,
    }
}
