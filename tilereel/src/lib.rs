//! tilereel - animated timelapses from dated map tiles
//!
//! Turns a geographic bounding box and a date range into one video (GIF or
//! MP4) where each frame is one day of imagery from a slippy-map tile
//! service. Large areas are rendered in batches of at most
//! `max_batch_dim × max_batch_dim` tiles and stitched back together, so
//! memory and disk usage stay bounded regardless of area or duration.
//!
//! # High-Level API
//!
//! ```ignore
//! use tilereel::service::{AnimationService, ServiceConfig};
//! use tilereel::request::AnimationRequest;
//!
//! let service = AnimationService::new(client, source, encoder, store, config);
//! let id = service
//!     .submit(&AnimationRequest::new([-10.0, 35.0, 5.0, 45.0], "2021-06-01", "2021-06-10"))
//!     .await?;
//! ```

pub mod batch;
pub mod compositor;
pub mod config;
pub mod coord;
pub mod dates;
pub mod encode;
pub mod fetch;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod recipe;
pub mod request;
pub mod service;

/// Version of the tilereel library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
