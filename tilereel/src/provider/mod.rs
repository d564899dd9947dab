//! Tile imagery source abstraction
//!
//! A [`TileSource`] turns a (date, tile) pair into a URL and an
//! [`AsyncHttpClient`] fetches it. Keeping the client behind a trait lets
//! tests substitute servers that 404, stall, or return fixed imagery.
//!
//! ```ignore
//! use tilereel::provider::{AsyncReqwestClient, TileSource};
//!
//! let client = AsyncReqwestClient::with_timeout(30)?;
//! let source = TileSource::new("https://tiles.example.com/{date}/{z}/{y}/{x}.jpg", 6)?;
//! ```

mod http;
mod source;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use source::TileSource;
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
