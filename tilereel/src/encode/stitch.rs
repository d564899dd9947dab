//! Final artifact assembly from batch clips.

use super::types::{ClipGrid, StitchError};
use super::ClipEncoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tiles batch clips back into one spatially contiguous video.
///
/// Clip `(r, c)` lands at grid row `r`, column `c`; row 0 is the northern
/// edge. Frame N of the output is frame N of every input.
#[derive(Clone)]
pub struct FinalStitcher {
    encoder: Arc<dyn ClipEncoder>,
    fps: u32,
}

impl FinalStitcher {
    pub fn new(encoder: Arc<dyn ClipEncoder>, fps: u32) -> Self {
        Self {
            encoder,
            fps: fps.max(1),
        }
    }

    /// Validates `grid`, stitches it at `staging` and publishes the result
    /// at `output`.
    ///
    /// `output` only ever appears complete: the backend writes to
    /// `staging`, which is moved into place after the output check passes
    /// and removed when anything fails. A single-clip grid is published
    /// without re-encoding.
    #[instrument(skip(self, grid), fields(rows = grid.rows(), cols = grid.cols()))]
    pub async fn stitch(
        &self,
        grid: &ClipGrid,
        staging: &Path,
        output: &Path,
    ) -> Result<PathBuf, StitchError> {
        validate_grid(grid).await?;

        let source = if grid.is_single() {
            debug!("Single batch, publishing clip without re-encoding");
            grid.clips()[0].path.clone()
        } else {
            if let Err(e) = self.stitch_to(grid, staging).await {
                discard(staging).await;
                return Err(e);
            }
            staging.to_path_buf()
        };

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        publish(&source, output).await?;

        info!(
            output = %output.display(),
            width = grid.width(),
            height = grid.height(),
            frames = grid.frame_count(),
            "Animation stitched"
        );
        Ok(output.to_path_buf())
    }

    async fn stitch_to(&self, grid: &ClipGrid, staging: &Path) -> Result<(), StitchError> {
        if let Some(parent) = staging.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.encoder.stitch(grid, self.fps, staging).await?;

        match tokio::fs::metadata(staging).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(StitchError::NoOutput(staging.to_path_buf())),
        }
    }
}

/// Checks presence, frame counts, and row/column alignment of every clip.
pub(crate) async fn validate_grid(grid: &ClipGrid) -> Result<(), StitchError> {
    if grid.clips().is_empty() || grid.rows() == 0 || grid.cols() == 0 {
        return Err(StitchError::EmptyGrid);
    }

    let expected_len = (grid.rows() * grid.cols()) as usize;
    if grid.clips().len() != expected_len {
        return Err(StitchError::LayoutMismatch(format!(
            "{} clips for a {}x{} grid",
            grid.clips().len(),
            grid.rows(),
            grid.cols()
        )));
    }

    let expected_frames = grid.frame_count();
    let row_width = grid.width();

    for row in 0..grid.rows() {
        let clips = grid.row(row);
        let height = clips[0].height;
        let mut width = 0;

        for (col, clip) in clips.iter().enumerate() {
            if clip.row != row || clip.col != col as u32 {
                return Err(StitchError::LayoutMismatch(format!(
                    "clip ({}, {}) found at position ({}, {})",
                    clip.row, clip.col, row, col
                )));
            }
            if !tokio::fs::try_exists(&clip.path).await.unwrap_or(false) {
                return Err(StitchError::MissingClip {
                    row: clip.row,
                    col: clip.col,
                    path: clip.path.clone(),
                });
            }
            if clip.frame_count != expected_frames {
                return Err(StitchError::FrameCountMismatch {
                    row: clip.row,
                    col: clip.col,
                    expected: expected_frames,
                    actual: clip.frame_count,
                });
            }
            if clip.height != height {
                return Err(StitchError::LayoutMismatch(format!(
                    "row {} mixes heights {} and {}",
                    row, height, clip.height
                )));
            }
            width += clip.width;
        }

        if width != row_width {
            return Err(StitchError::LayoutMismatch(format!(
                "row {} is {} pixels wide, row 0 is {}",
                row, width, row_width
            )));
        }
    }

    Ok(())
}

/// Moves a finished file to `to`.
///
/// Falls back to copying through a `.partial` sibling when `from` sits on
/// another filesystem, so `to` never exists half-written.
async fn publish(from: &Path, to: &Path) -> Result<(), StitchError> {
    match tokio::fs::metadata(from).await {
        Ok(meta) if meta.len() > 0 => {}
        _ => return Err(StitchError::NoOutput(from.to_path_buf())),
    }

    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }

    let mut partial = to.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let copied = async {
        tokio::fs::copy(from, &partial).await?;
        tokio::fs::rename(&partial, to).await
    }
    .await;
    if let Err(e) = copied {
        discard(&partial).await;
        return Err(e.into());
    }

    discard(from).await;
    Ok(())
}

/// Best-effort removal of a scratch file.
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scratch file"),
    }
}
