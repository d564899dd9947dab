//! Per-batch clip encoding.

use super::types::{BatchClip, EncodeError, FrameSequence};
use super::ClipEncoder;
use crate::batch::Batch;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Encodes one batch's frame sequence into a clip.
///
/// Frame N of the clip is day N of the job.
#[derive(Clone)]
pub struct BatchEncoder {
    encoder: Arc<dyn ClipEncoder>,
    fps: u32,
    tile_size: u32,
}

impl BatchEncoder {
    pub fn new(encoder: Arc<dyn ClipEncoder>, fps: u32, tile_size: u32) -> Self {
        Self {
            encoder,
            fps: fps.max(1),
            tile_size,
        }
    }

    /// Clip file extension of the underlying backend.
    pub fn extension(&self) -> &'static str {
        self.encoder.extension()
    }

    /// Encodes `frames` for `batch` into `<clips_dir>/<batch label>.<ext>`.
    ///
    /// # Errors
    ///
    /// Fails on an empty sequence, a backend failure, or a backend that
    /// reports success without leaving a non-empty file behind.
    #[instrument(skip(self, frames, clips_dir), fields(batch = %batch.label(), frames = frames.len()))]
    pub async fn encode(
        &self,
        batch: &Batch,
        frames: &FrameSequence,
        clips_dir: &Path,
    ) -> Result<BatchClip, EncodeError> {
        if frames.is_empty() {
            return Err(EncodeError::NoFrames);
        }

        tokio::fs::create_dir_all(clips_dir).await?;
        let path = clips_dir.join(format!("{}.{}", batch.label(), self.extension()));

        self.encoder.encode_clip(frames, self.fps, &path).await?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() > 0 => {}
            _ => return Err(EncodeError::NoOutput(path)),
        }

        let (width, height) = batch.frame_dimensions(self.tile_size);
        info!(
            encoder = self.encoder.name(),
            path = %path.display(),
            width,
            height,
            "Batch clip encoded"
        );

        Ok(BatchClip {
            row: batch.row,
            col: batch.col,
            path,
            frame_count: frames.len(),
            width,
            height,
        })
    }
}
