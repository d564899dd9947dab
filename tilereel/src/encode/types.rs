//! Encoding types and errors.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Available video backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderKind {
    /// Animated GIF, encoded in-process
    #[default]
    Gif,
    /// H.264 MP4 via an external `ffmpeg`
    Ffmpeg,
}

impl EncoderKind {
    /// File extension of artifacts produced by this backend.
    pub fn extension(&self) -> &'static str {
        match self {
            EncoderKind::Gif => "gif",
            EncoderKind::Ffmpeg => "mp4",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EncoderKind::Gif => "gif",
            EncoderKind::Ffmpeg => "ffmpeg",
        }
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncoderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(EncoderKind::Gif),
            "ffmpeg" | "mp4" => Ok(EncoderKind::Ffmpeg),
            other => Err(format!("unknown encoder '{}' (expected gif or ffmpeg)", other)),
        }
    }
}

/// Consecutively numbered frame images in one directory.
///
/// Frame `i` lives at `<dir>/frame_<i:05>.png`, matching the day index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    dir: PathBuf,
    count: usize,
}

impl FrameSequence {
    /// printf-style pattern understood by ffmpeg's image2 demuxer.
    pub const PATTERN: &'static str = "frame_%05d.png";

    pub fn new(dir: impl Into<PathBuf>, count: usize) -> Self {
        Self {
            dir: dir.into(),
            count,
        }
    }

    /// File name of frame `index`.
    pub fn file_name(index: usize) -> String {
        format!("frame_{:05}.png", index)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(Self::file_name(index))
    }

    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (0..self.count).map(|i| self.frame_path(i))
    }
}

/// One encoded batch clip and its position in the batch grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchClip {
    pub row: u32,
    pub col: u32,
    pub path: PathBuf,
    pub frame_count: usize,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

/// Row-major grid of batch clips awaiting stitching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipGrid {
    rows: u32,
    cols: u32,
    clips: Vec<BatchClip>,
}

impl ClipGrid {
    pub fn new(rows: u32, cols: u32, clips: Vec<BatchClip>) -> Self {
        Self { rows, cols, clips }
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn clips(&self) -> &[BatchClip] {
        &self.clips
    }

    pub fn is_single(&self) -> bool {
        self.rows == 1 && self.cols == 1 && self.clips.len() == 1
    }

    /// Clips of one grid row, west to east.
    pub fn row(&self, row: u32) -> &[BatchClip] {
        let start = (row * self.cols) as usize;
        let end = (start + self.cols as usize).min(self.clips.len());
        self.clips.get(start..end).unwrap_or(&[])
    }

    /// Frame count shared by every clip (taken from the first).
    pub fn frame_count(&self) -> usize {
        self.clips.first().map(|c| c.frame_count).unwrap_or(0)
    }

    /// Stitched width: the sum of the first row's widths.
    pub fn width(&self) -> u32 {
        self.row(0).iter().map(|c| c.width).sum()
    }

    /// Stitched height: the sum of the first column's heights.
    pub fn height(&self) -> u32 {
        (0..self.rows)
            .filter_map(|r| self.row(r).first())
            .map(|c| c.height)
            .sum()
    }
}

/// Errors from encoding one batch clip.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("No frames to encode")]
    NoFrames,

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Encoder exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("Encoder produced no output at {0}")]
    NoOutput(PathBuf),

    #[error("Frame image error: {0}")]
    Image(String),

    #[error("Encoder I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Encoder task failed: {0}")]
    TaskFailed(String),
}

impl From<image::ImageError> for EncodeError {
    fn from(e: image::ImageError) -> Self {
        EncodeError::Image(e.to_string())
    }
}

/// Errors from stitching batch clips into the final artifact.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error("Clip grid is empty")]
    EmptyGrid,

    #[error("Clip for batch ({row}, {col}) is missing at {path}")]
    MissingClip { row: u32, col: u32, path: PathBuf },

    #[error("Clip for batch ({row}, {col}) has {actual} frames, expected {expected}")]
    FrameCountMismatch {
        row: u32,
        col: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Clip layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("Stitch output missing at {0}")]
    NoOutput(PathBuf),

    #[error(transparent)]
    Encoder(#[from] EncodeError),

    #[error("Stitch I/O error: {0}")]
    Io(#[from] io::Error),
}
