//! ffmpeg backend producing H.264 MP4 clips.
//!
//! Batch clips are encoded from the numbered PNG frames with the image2
//! demuxer. Stitching builds an `hstack` per grid row and a final `vstack`
//! over the rows, so the grid is reassembled in a single ffmpeg pass.

use super::types::{ClipGrid, EncodeError, FrameSequence, StitchError};
use super::ClipEncoder;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::process::Command;
use tracing::{debug, warn};

/// Pads odd dimensions to even; yuv420p requires it.
const EVEN_DIMENSIONS_FILTER: &str = "pad=ceil(iw/2)*2:ceil(ih/2)*2";

/// Encoder that shells out to `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegClipEncoder {
    program: PathBuf,
}

impl FfmpegClipEncoder {
    /// Creates an encoder invoking `program` (a path or a name on `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), EncodeError> {
        debug!(program = %self.program.display(), args = ?args, "Running ffmpeg");

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| EncodeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        warn!(status = %output.status, stderr = %stderr, "ffmpeg failed");
        Err(EncodeError::ProcessFailed {
            status: output.status.to_string(),
            stderr,
        })
    }
}

impl Default for FfmpegClipEncoder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FFMPEG_PATH)
    }
}

impl ClipEncoder for FfmpegClipEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn extension(&self) -> &'static str {
        "mp4"
    }

    fn encode_clip<'a>(
        &'a self,
        frames: &'a FrameSequence,
        fps: u32,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), EncodeError>> + Send + 'a>> {
        Box::pin(async move {
            if frames.is_empty() {
                return Err(EncodeError::NoFrames);
            }
            self.run(encode_args(frames, fps, output)).await
        })
    }

    fn stitch<'a>(
        &'a self,
        grid: &'a ClipGrid,
        fps: u32,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), StitchError>> + Send + 'a>> {
        Box::pin(async move {
            self.run(stitch_args(grid, fps, output)).await?;
            Ok(())
        })
    }
}

fn base_args() -> Vec<OsString> {
    ["-hide_banner", "-loglevel", "error", "-y"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn h264_args(fps: u32) -> Vec<OsString> {
    let fps = fps.max(1).to_string();
    [
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-r",
        fps.as_str(),
        "-movflags",
        "+faststart",
    ]
    .into_iter()
    .map(OsString::from)
    .collect()
}

/// Arguments encoding a numbered frame sequence into one clip.
fn encode_args(frames: &FrameSequence, fps: u32, output: &Path) -> Vec<OsString> {
    let mut args = base_args();
    args.push("-framerate".into());
    args.push(fps.max(1).to_string().into());
    args.push("-start_number".into());
    args.push("0".into());
    args.push("-i".into());
    args.push(frames.dir().join(FrameSequence::PATTERN).into_os_string());
    args.push("-frames:v".into());
    args.push(frames.len().to_string().into());
    args.push("-vf".into());
    args.push(EVEN_DIMENSIONS_FILTER.into());
    args.extend(h264_args(fps));
    args.push(output.as_os_str().to_owned());
    args
}

/// Filter graph tiling `rows × cols` inputs, returning `(graph, output label)`.
///
/// Inputs are numbered row-major. Single-input rows skip `hstack`, and a
/// single row skips `vstack`.
fn stack_filter(rows: u32, cols: u32) -> (String, String) {
    let mut parts = Vec::new();
    let mut row_labels = Vec::new();

    for row in 0..rows {
        let inputs: String = (0..cols)
            .map(|col| format!("[{}:v]", row * cols + col))
            .collect();
        if cols == 1 {
            row_labels.push(inputs);
        } else {
            let label = format!("[r{}]", row);
            parts.push(format!("{}hstack=inputs={}{}", inputs, cols, label));
            row_labels.push(label);
        }
    }

    let output = if rows == 1 {
        row_labels.concat()
    } else {
        parts.push(format!("{}vstack=inputs={}[out]", row_labels.concat(), rows));
        "[out]".to_string()
    };

    (parts.join(";"), output)
}

/// Arguments stitching every clip of `grid` into one clip.
fn stitch_args(grid: &ClipGrid, fps: u32, output: &Path) -> Vec<OsString> {
    let mut args = base_args();
    for clip in grid.clips() {
        args.push("-i".into());
        args.push(clip.path.as_os_str().to_owned());
    }

    let (filter, label) = stack_filter(grid.rows(), grid.cols());
    args.push("-map".into());
    if filter.is_empty() {
        args.push("0:v".into());
    } else {
        args.push(label.into());
        args.push("-filter_complex".into());
        args.push(filter.into());
    }
    args.extend(h264_args(fps));
    args.push(output.as_os_str().to_owned());
    args
}
