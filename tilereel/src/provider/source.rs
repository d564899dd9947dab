//! URL templating for daily tiled imagery services.

use super::types::ProviderError;
use crate::coord::{TileCoord, MAX_ZOOM};
use chrono::NaiveDate;

const DATE_TOKEN: &str = "{date}";
const X_TOKEN: &str = "{x}";
const Y_TOKEN: &str = "{y}";
const Z_TOKEN: &str = "{z}";

/// A tiled imagery endpoint addressed by date and tile x/y at a fixed zoom.
///
/// Templates use `{date}` (YYYY-MM-DD), `{x}`, `{y}` and `{z}` placeholders.
/// `{x}` and `{y}` are mandatory; a template without `{date}` serves the
/// same imagery for every day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    url_template: String,
    zoom: u8,
}

impl TileSource {
    pub fn new(url_template: impl Into<String>, zoom: u8) -> Result<Self, ProviderError> {
        let url_template = url_template.into();

        for token in [X_TOKEN, Y_TOKEN] {
            if !url_template.contains(token) {
                return Err(ProviderError::InvalidTemplate {
                    template: url_template,
                    reason: format!("missing {} placeholder", token),
                });
            }
        }
        if zoom > MAX_ZOOM {
            return Err(ProviderError::UnsupportedZoom(zoom));
        }

        Ok(Self { url_template, zoom })
    }

    #[inline]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Renders the URL for one tile on one day.
    pub fn tile_url(&self, date: NaiveDate, tile: &TileCoord) -> String {
        self.url_template
            .replace(DATE_TOKEN, &crate::dates::format_date(date))
            .replace(Z_TOKEN, &tile.zoom.to_string())
            .replace(X_TOKEN, &tile.x.to_string())
            .replace(Y_TOKEN, &tile.y.to_string())
    }
}
