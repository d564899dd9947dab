//! Tile-to-animation render pipeline.
//!
//! # Architecture
//!
//! ```text
//! AnimationRequest
//!     │  RenderPlan::build (validate, map bbox to tiles, enumerate days, plan batches)
//!     ▼
//! for each batch (row-major, sequential)
//!     for each day (in order)
//!         FrameCompositor ── TileFetcher × tiles (concurrent, placeholder on failure)
//!         recipe → frames/frame_<n>.png
//!     BatchEncoder → clips/batch_<r>_<c>.<ext>
//!     ▼
//! FinalStitcher → <output_dir>/<job_id>.<ext>
//! ```
//!
//! Batches bound peak memory and disk usage: only one batch's tiles and
//! frames exist at a time. Frame N of every clip is day N.

mod error;
mod plan;
mod renderer;

pub use error::RenderError;
pub use plan::RenderPlan;
pub use renderer::AnimationRenderer;
