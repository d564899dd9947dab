//! Animated GIF backend.
//!
//! Encoding and stitching run on the blocking pool. Stitching streams the
//! source clips frame by frame, so memory holds one frame per clip plus the
//! output canvas regardless of the day count.

use super::types::{ClipGrid, EncodeError, FrameSequence, StitchError};
use super::ClipEncoder;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, RgbaImage};
use std::fs::File;
use std::future::Future;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::pin::Pin;
use tracing::debug;

/// NeuQuant sampling factor, 1 (best) to 30 (fastest).
const QUANTIZER_SPEED: i32 = 10;

/// In-process GIF encoder.
#[derive(Debug, Clone, Default)]
pub struct GifClipEncoder;

impl GifClipEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl ClipEncoder for GifClipEncoder {
    fn name(&self) -> &str {
        "gif"
    }

    fn extension(&self) -> &'static str {
        "gif"
    }

    fn encode_clip<'a>(
        &'a self,
        frames: &'a FrameSequence,
        fps: u32,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), EncodeError>> + Send + 'a>> {
        Box::pin(async move {
            let frames = frames.clone();
            let output = output.to_path_buf();
            tokio::task::spawn_blocking(move || encode_gif(&frames, fps, &output))
                .await
                .map_err(|e| EncodeError::TaskFailed(e.to_string()))?
        })
    }

    fn stitch<'a>(
        &'a self,
        grid: &'a ClipGrid,
        fps: u32,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), StitchError>> + Send + 'a>> {
        Box::pin(async move {
            let grid = grid.clone();
            let output = output.to_path_buf();
            tokio::task::spawn_blocking(move || stitch_gif(&grid, fps, &output))
                .await
                .map_err(|e| EncodeError::TaskFailed(e.to_string()))?
        })
    }
}

fn frame_delay(fps: u32) -> Delay {
    Delay::from_numer_denom_ms(1000, fps.max(1))
}

fn create_encoder(output: &Path) -> Result<GifEncoder<BufWriter<File>>, EncodeError> {
    let file = File::create(output)?;
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), QUANTIZER_SPEED);
    encoder.set_repeat(Repeat::Infinite)?;
    Ok(encoder)
}

fn encode_gif(frames: &FrameSequence, fps: u32, output: &Path) -> Result<(), EncodeError> {
    if frames.is_empty() {
        return Err(EncodeError::NoFrames);
    }

    let delay = frame_delay(fps);
    let mut encoder = create_encoder(output)?;
    for path in frames.paths() {
        let image = image::open(&path)?.to_rgba8();
        encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
    }
    drop(encoder);

    debug!(output = %output.display(), frames = frames.len(), "GIF clip written");
    Ok(())
}

/// Top-left pixel position of every clip in row-major order.
fn clip_offsets(grid: &ClipGrid) -> Vec<(u32, u32)> {
    let mut offsets = Vec::with_capacity(grid.clips().len());
    let mut y = 0;
    for row in 0..grid.rows() {
        let clips = grid.row(row);
        let mut x = 0;
        for clip in clips {
            offsets.push((x, y));
            x += clip.width;
        }
        y += clips.first().map(|c| c.height).unwrap_or(0);
    }
    offsets
}

fn open_clip(path: &Path) -> Result<GifDecoder<BufReader<File>>, StitchError> {
    let file = File::open(path)?;
    GifDecoder::new(BufReader::new(file)).map_err(|e| StitchError::Encoder(e.into()))
}

fn stitch_gif(grid: &ClipGrid, fps: u32, output: &Path) -> Result<(), StitchError> {
    let mut streams = Vec::with_capacity(grid.clips().len());
    for clip in grid.clips() {
        streams.push(open_clip(&clip.path)?.into_frames());
    }

    let offsets = clip_offsets(grid);
    let (width, height) = (grid.width(), grid.height());
    let expected = grid.frame_count();
    let delay = frame_delay(fps);
    let mut encoder = create_encoder(output)?;

    for index in 0..expected {
        let mut canvas = RgbaImage::new(width, height);
        for ((clip, stream), (x, y)) in grid.clips().iter().zip(streams.iter_mut()).zip(&offsets) {
            let frame = stream
                .next()
                .ok_or(StitchError::FrameCountMismatch {
                    row: clip.row,
                    col: clip.col,
                    expected,
                    actual: index,
                })?
                .map_err(|e| StitchError::Encoder(e.into()))?;
            image::imageops::replace(&mut canvas, frame.buffer(), *x as i64, *y as i64);
        }
        encoder
            .encode_frame(Frame::from_parts(canvas, 0, 0, delay))
            .map_err(|e| StitchError::Encoder(e.into()))?;
    }
    drop(encoder);

    debug!(
        output = %output.display(),
        width,
        height,
        frames = expected,
        "GIF clips stitched"
    );
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::encode::BatchClip;
    use image::Rgba;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Writes `colors.len()` solid frames of `width × height` into `dir`.
    pub(crate) fn write_frames(dir: &Path, width: u32, height: u32, colors: &[Rgba<u8>]) -> FrameSequence {
        std::fs::create_dir_all(dir).unwrap();
        let seq = FrameSequence::new(dir, colors.len());
        for (i, color) in colors.iter().enumerate() {
            RgbaImage::from_pixel(width, height, *color)
                .save(seq.frame_path(i))
                .unwrap();
        }
        seq
    }

    pub(crate) fn decode_frames(path: &Path) -> Vec<RgbaImage> {
        let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
        decoder
            .into_frames()
            .collect_frames()
            .unwrap()
            .into_iter()
            .map(|f| f.into_buffer())
            .collect()
    }

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[tokio::test]
    async fn test_encode_clip_has_one_frame_per_image() {
        let temp = TempDir::new().unwrap();
        let frames = write_frames(&temp.path().join("frames"), 16, 8, &[RED, GREEN, BLUE]);
        let output = temp.path().join("clip.gif");

        GifClipEncoder::new()
            .encode_clip(&frames, 10, &output)
            .await
            .unwrap();

        let decoded = decode_frames(&output);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].dimensions(), (16, 8));
        assert_eq!(*decoded[1].get_pixel(3, 3), GREEN);
    }

    #[tokio::test]
    async fn test_encode_empty_sequence_fails() {
        let temp = TempDir::new().unwrap();
        let frames = FrameSequence::new(temp.path(), 0);
        let result = GifClipEncoder::new()
            .encode_clip(&frames, 10, &temp.path().join("clip.gif"))
            .await;
        assert!(matches!(result, Err(EncodeError::NoFrames)));
    }

    #[tokio::test]
    async fn test_stitch_places_clips_side_by_side() {
        let temp = TempDir::new().unwrap();
        let encoder = GifClipEncoder::new();

        let left_frames = write_frames(&temp.path().join("left"), 8, 8, &[RED, RED]);
        let right_frames = write_frames(&temp.path().join("right"), 4, 8, &[BLUE, GREEN]);
        let left = temp.path().join("left.gif");
        let right = temp.path().join("right.gif");
        encoder.encode_clip(&left_frames, 5, &left).await.unwrap();
        encoder.encode_clip(&right_frames, 5, &right).await.unwrap();

        let grid = ClipGrid::new(
            1,
            2,
            vec![
                BatchClip {
                    row: 0,
                    col: 0,
                    path: left,
                    frame_count: 2,
                    width: 8,
                    height: 8,
                },
                BatchClip {
                    row: 0,
                    col: 1,
                    path: right,
                    frame_count: 2,
                    width: 4,
                    height: 8,
                },
            ],
        );
        let output = temp.path().join("final.gif");
        encoder.stitch(&grid, 5, &output).await.unwrap();

        let decoded = decode_frames(&output);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].dimensions(), (12, 8));
        assert_eq!(*decoded[0].get_pixel(0, 0), RED);
        assert_eq!(*decoded[0].get_pixel(10, 0), BLUE);
        assert_eq!(*decoded[1].get_pixel(10, 7), GREEN);
    }

    #[tokio::test]
    async fn test_stitch_detects_short_clip() {
        let temp = TempDir::new().unwrap();
        let encoder = GifClipEncoder::new();
        let frames = write_frames(&temp.path().join("f"), 4, 4, &[RED]);
        let clip_path = temp.path().join("short.gif");
        encoder.encode_clip(&frames, 5, &clip_path).await.unwrap();

        // Metadata claims more frames than the file holds.
        let grid = ClipGrid::new(
            1,
            1,
            vec![BatchClip {
                row: 0,
                col: 0,
                path: clip_path,
                frame_count: 3,
                width: 4,
                height: 4,
            }],
        );
        let result = encoder.stitch(&grid, 5, &temp.path().join("out.gif")).await;
        assert!(matches!(
            result,
            Err(StitchError::FrameCountMismatch { actual: 1, .. })
        ));
    }

    #[test]
    fn test_clip_offsets() {
        let clip = |row, col, width, height| BatchClip {
            row,
            col,
            path: PathBuf::new(),
            frame_count: 1,
            width,
            height,
        };
        let grid = ClipGrid::new(
            2,
            2,
            vec![clip(0, 0, 16, 16), clip(0, 1, 8, 16), clip(1, 0, 16, 4), clip(1, 1, 8, 4)],
        );
        assert_eq!(clip_offsets(&grid), vec![(0, 0), (16, 0), (0, 16), (16, 16)]);
    }
}
