//! Error types for the render pipeline.
//!
//! Tile fetch failures never appear here: they degrade to placeholders
//! inside the compositor. Everything below fails the whole job.

use crate::compositor::CompositeError;
use crate::encode::{EncodeError, StitchError};
use thiserror::Error;

/// Errors that abort a render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Frame composition failed for infrastructure reasons
    #[error("frame composition failed: {0}")]
    Composite(#[from] CompositeError),

    /// A batch clip could not be encoded
    #[error("batch encoding failed: {0}")]
    Encode(#[from] EncodeError),

    /// Batch clips could not be stitched
    #[error("stitching failed: {0}")]
    Stitch(#[from] StitchError),

    /// Writing an intermediate frame failed
    #[error("failed to write frame {index}: {message}")]
    FrameWrite { index: usize, message: String },

    /// Scratch or output directory I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job was cancelled by the client
    #[error("cancelled")]
    Cancelled,

    /// Internal error (e.g. a blocking task panicked)
    #[error("internal error: {0}")]
    Internal(String),
}
