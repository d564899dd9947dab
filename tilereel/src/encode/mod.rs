//! Clip encoding and stitching.
//!
//! A [`ClipEncoder`] turns an ordered frame sequence into one video clip and
//! spatially tiles a grid of equal-length clips into the final artifact.
//! Two backends exist:
//!
//! - [`GifClipEncoder`] - pure Rust via the `image` GIF codec
//! - [`FfmpegClipEncoder`] - shells out to an `ffmpeg` binary (H.264 MP4)
//!
//! [`BatchEncoder`] and [`FinalStitcher`] wrap a backend with the checks
//! every backend needs: non-empty input, existing output, and a consistent
//! clip grid.

mod batch;
mod ffmpeg;
mod gif;
mod stitch;
mod types;

pub use batch::BatchEncoder;
pub use ffmpeg::FfmpegClipEncoder;
pub use gif::GifClipEncoder;
pub use stitch::FinalStitcher;
pub use types::{BatchClip, ClipGrid, EncodeError, EncoderKind, FrameSequence, StitchError};

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

/// Video backend used by the pipeline.
///
/// Implementations must be object-safe so the backend can be chosen at
/// runtime from configuration.
pub trait ClipEncoder: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// File extension of produced clips, without the dot.
    fn extension(&self) -> &'static str;

    /// Encodes `frames` in order at `fps` into `output`.
    fn encode_clip<'a>(
        &'a self,
        frames: &'a FrameSequence,
        fps: u32,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), EncodeError>> + Send + 'a>>;

    /// Tiles the clips of `grid` into one clip at `output`.
    ///
    /// The grid has already been validated: every clip exists, all share a
    /// frame count, and rows and columns line up.
    fn stitch<'a>(
        &'a self,
        grid: &'a ClipGrid,
        fps: u32,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), StitchError>> + Send + 'a>>;
}

/// Builds the backend selected by `kind`.
pub fn create_encoder(kind: EncoderKind, ffmpeg_path: &Path) -> Arc<dyn ClipEncoder> {
    match kind {
        EncoderKind::Gif => Arc::new(GifClipEncoder::new()),
        EncoderKind::Ffmpeg => Arc::new(FfmpegClipEncoder::new(ffmpeg_path)),
    }
}
