//! Single-tile fetching with placeholder degradation.
//!
//! [`TileFetcher::fetch`] never fails: timeouts, non-2xx statuses, transport
//! errors and undecodable bodies all produce a solid placeholder tile of the
//! configured size, so compositing is never blocked by one missing tile.
//! Every tile, real or synthesized, is written as an RGBA PNG into the
//! caller's directory.

use crate::config::RenderSettings;
use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, ProviderError, TileSource};
use chrono::NaiveDate;
use image::{imageops::FilterType, ImageFormat, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Result of fetching one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTile {
    /// Tile that was requested
    pub tile: TileCoord,
    /// Written PNG, or `None` if the file could not be stored
    pub path: Option<PathBuf>,
    /// True if the stored image is a synthesized placeholder
    pub placeholder: bool,
}

/// Fetches tiles for one source and normalises them to a fixed size.
pub struct TileFetcher<C> {
    client: Arc<C>,
    source: TileSource,
    tile_size: u32,
    placeholder_color: Rgba<u8>,
    timeout: Duration,
}

impl<C: AsyncHttpClient> TileFetcher<C> {
    pub fn new(client: Arc<C>, source: TileSource, settings: &RenderSettings) -> Self {
        Self {
            client,
            source,
            tile_size: settings.tile_size(),
            placeholder_color: settings.placeholder_color(),
            timeout: settings.request_timeout(),
        }
    }

    #[inline]
    pub fn source(&self) -> &TileSource {
        &self.source
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Builds a placeholder tile of the configured size and colour.
    pub fn placeholder(&self) -> RgbaImage {
        placeholder_tile(self.tile_size, self.placeholder_color)
    }

    /// Fetches one tile for one day and stores it as `<dir>/<x>_<y>.png`.
    pub async fn fetch(&self, date: NaiveDate, tile: TileCoord, dir: &Path) -> FetchedTile {
        let image_bytes = match self.download(date, &tile).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.is_not_found() => {
                debug!(tile_x = tile.x, tile_y = tile.y, %date, "Tile missing, using placeholder");
                None
            }
            Err(e) => {
                warn!(
                    tile_x = tile.x,
                    tile_y = tile.y,
                    %date,
                    error = %e,
                    "Tile fetch failed, using placeholder"
                );
                None
            }
        };

        let path = dir.join(tile_file_name(&tile));
        let tile_size = self.tile_size;
        let color = self.placeholder_color;
        let target = path.clone();

        let stored = tokio::task::spawn_blocking(move || {
            let (image, placeholder) = match image_bytes {
                Some(bytes) => match normalize_tile(&bytes, tile_size) {
                    Ok(image) => (image, false),
                    Err(e) => {
                        warn!(
                            tile_x = tile.x,
                            tile_y = tile.y,
                            error = %e,
                            "Tile body could not be decoded, using placeholder"
                        );
                        (placeholder_tile(tile_size, color), true)
                    }
                },
                None => (placeholder_tile(tile_size, color), true),
            };
            image
                .save_with_format(&target, ImageFormat::Png)
                .map(|_| placeholder)
                .map_err(|e| e.to_string())
        })
        .await;

        match stored {
            Ok(Ok(placeholder)) => {
                trace!(tile_x = tile.x, tile_y = tile.y, placeholder, "Tile stored");
                FetchedTile {
                    tile,
                    path: Some(path),
                    placeholder,
                }
            }
            Ok(Err(e)) => {
                warn!(tile_x = tile.x, tile_y = tile.y, error = %e, "Failed to store tile");
                FetchedTile {
                    tile,
                    path: None,
                    placeholder: true,
                }
            }
            Err(e) => {
                warn!(tile_x = tile.x, tile_y = tile.y, error = %e, "Tile storage task failed");
                FetchedTile {
                    tile,
                    path: None,
                    placeholder: true,
                }
            }
        }
    }

    /// Downloads raw bytes under the request deadline.
    async fn download(&self, date: NaiveDate, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        let url = self.source.tile_url(date, tile);
        match tokio::time::timeout(self.timeout, self.client.get(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }
}

/// File name a tile is stored under within a date directory.
pub fn tile_file_name(tile: &TileCoord) -> String {
    format!("{}_{}.png", tile.x, tile.y)
}

/// Solid RGBA tile of the given edge length.
pub fn placeholder_tile(tile_size: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(tile_size, tile_size, color)
}

/// Decodes an image body and resizes it to `tile_size × tile_size` if needed.
fn normalize_tile(bytes: &[u8], tile_size: u32) -> Result<RgbaImage, image::ImageError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    if image.width() == tile_size && image.height() == tile_size {
        return Ok(image);
    }
    Ok(image::imageops::resize(
        &image,
        tile_size,
        tile_size,
        FilterType::Triangle,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::provider::MockAsyncHttpClient;
    use std::io::Cursor;

    fn png_bytes(size: u32, color: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(size, size, color);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn source() -> TileSource {
        TileSource::new("http://tiles.test/{date}/{z}/{x}/{y}.png", 2).unwrap()
    }

    fn tile() -> TileCoord {
        TileCoord { x: 1, y: 2, zoom: 2 }
    }

    fn settings() -> RenderSettings {
        RenderSettings::default()
            .with_tile_size(64)
            .with_placeholder_color(Rgba([10, 20, 30, 255]))
    }

    struct SlowClient;

    impl AsyncHttpClient for SlowClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    async fn fetch_with<C: AsyncHttpClient>(client: C, settings: RenderSettings) -> (FetchedTile, RgbaImage) {
        let dir = tempfile::TempDir::new().unwrap();
        let fetcher = TileFetcher::new(Arc::new(client), source(), &settings);
        let fetched = fetcher
            .fetch(parse_date("2020-01-01").unwrap(), tile(), dir.path())
            .await;
        let image = image::open(fetched.path.as_ref().unwrap()).unwrap().to_rgba8();
        (fetched, image)
    }

    #[tokio::test]
    async fn test_successful_fetch_is_stored() {
        let client = MockAsyncHttpClient {
            response: Ok(png_bytes(64, Rgba([0, 255, 0, 255]))),
        };
        let (fetched, image) = fetch_with(client, settings()).await;

        assert!(!fetched.placeholder);
        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(*image.get_pixel(5, 5), Rgba([0, 255, 0, 255]));
        assert!(fetched.path.unwrap().ends_with("1_2.png"));
    }

    #[tokio::test]
    async fn test_wrong_size_is_resized() {
        let client = MockAsyncHttpClient {
            response: Ok(png_bytes(16, Rgba([0, 0, 255, 255]))),
        };
        let (fetched, image) = fetch_with(client, settings()).await;

        assert!(!fetched.placeholder);
        assert_eq!(image.dimensions(), (64, 64));
    }

    #[tokio::test]
    async fn test_not_found_degrades_to_placeholder() {
        let (fetched, image) = fetch_with(MockAsyncHttpClient::not_found(), settings()).await;

        assert!(fetched.placeholder);
        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(*image.get_pixel(63, 63), Rgba([10, 20, 30, 255]));
    }

    #[tokio::test]
    async fn test_transport_error_degrades_to_placeholder() {
        let client = MockAsyncHttpClient {
            response: Err(ProviderError::HttpError("connection refused".to_string())),
        };
        let (fetched, image) = fetch_with(client, settings()).await;

        assert!(fetched.placeholder);
        assert_eq!(image.dimensions(), (64, 64));
    }

    #[tokio::test]
    async fn test_garbage_body_degrades_to_placeholder() {
        let client = MockAsyncHttpClient {
            response: Ok(b"<html>rate limited</html>".to_vec()),
        };
        let (fetched, _) = fetch_with(client, settings()).await;
        assert!(fetched.placeholder);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_placeholder() {
        let settings = settings().with_request_timeout(Duration::from_millis(50));
        let started = std::time::Instant::now();
        let (fetched, image) = fetch_with(SlowClient, settings).await;

        assert!(fetched.placeholder);
        assert_eq!(image.dimensions(), (64, 64));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_unwritable_directory_still_returns() {
        let fetcher = TileFetcher::new(
            Arc::new(MockAsyncHttpClient::not_found()),
            source(),
            &settings(),
        );
        let fetched = fetcher
            .fetch(
                parse_date("2020-01-01").unwrap(),
                tile(),
                Path::new("/nonexistent/tilereel/dir"),
            )
            .await;

        assert!(fetched.placeholder);
        assert!(fetched.path.is_none());
    }

    #[test]
    fn test_placeholder_dimensions_and_color() {
        let tile = placeholder_tile(512, Rgba([1, 2, 3, 255]));
        assert_eq!(tile.dimensions(), (512, 512));
        assert!(tile.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }
}
