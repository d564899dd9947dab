//! Provider error types

use thiserror::Error;

/// Errors that can occur while talking to a tile source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Transport-level failure (DNS, connect, reset, body read)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Request exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// URL template is unusable
    #[error("Invalid tile URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Zoom level outside the supported range
    #[error("Zoom level {0} not supported by tile source")]
    UnsupportedZoom(u8),
}

impl ProviderError {
    /// Returns true if the server reported the tile as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::HttpStatus { status: 404, .. })
    }
}
