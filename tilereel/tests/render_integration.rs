//! End-to-end tests for the animation service.
//!
//! These tests run the complete pipeline against in-process tile servers:
//! - Placeholder degradation when every tile is missing
//! - Multi-batch rendering and stitching
//! - Failure and cancellation handling with workspace cleanup

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat, Rgba, RgbaImage};
use std::fs::File;
use std::future::Future;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tilereel::config::RenderSettings;
use tilereel::encode::{ClipEncoder, ClipGrid, EncodeError, FrameSequence, GifClipEncoder, StitchError};
use tilereel::job::{InMemoryJobStore, JobStatus};
use tilereel::provider::{AsyncHttpClient, ProviderError, TileSource};
use tilereel::request::AnimationRequest;
use tilereel::service::{AnimationService, ServiceConfig};

// =============================================================================
// Test Helpers
// =============================================================================

const TEMPLATE: &str = "http://tiles.test/{date}/{z}/{x}/{y}.png";
const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);
const POLL: Duration = Duration::from_millis(20);

/// Answers 404 for every tile.
struct MissingTiles;

impl AsyncHttpClient for MissingTiles {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })
    }
}

/// Serves solid tiles coloured by position; tile (2, 2) is missing.
struct ColoredTiles {
    tile_size: u32,
}

impl ColoredTiles {
    fn color_for(x: u32, y: u32) -> Option<Rgba<u8>> {
        match (x, y) {
            (1, 1) => Some(Rgba([255, 0, 0, 255])),
            (2, 1) => Some(Rgba([0, 255, 0, 255])),
            (1, 2) => Some(Rgba([0, 0, 255, 255])),
            _ => None,
        }
    }
}

impl AsyncHttpClient for ColoredTiles {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        // .../{z}/{x}/{y}.png
        let parts: Vec<&str> = url.trim_end_matches(".png").rsplit('/').take(2).collect();
        let y: u32 = parts[0].parse().map_err(|_| ProviderError::HttpError(url.into()))?;
        let x: u32 = parts[1].parse().map_err(|_| ProviderError::HttpError(url.into()))?;

        let Some(color) = Self::color_for(x, y) else {
            return Err(ProviderError::HttpStatus {
                status: 404,
                url: url.to_string(),
            });
        };

        let mut buffer = Cursor::new(Vec::new());
        RgbaImage::from_pixel(self.tile_size, self.tile_size, color)
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

/// Answers slowly so a job is still running when it is cancelled.
struct SlowTiles;

impl AsyncHttpClient for SlowTiles {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Err(ProviderError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })
    }
}

/// Encoder whose process always exits non-zero.
struct FailingEncoder;

impl ClipEncoder for FailingEncoder {
    fn name(&self) -> &str {
        "failing"
    }

    fn extension(&self) -> &'static str {
        "mp4"
    }

    fn encode_clip<'a>(
        &'a self,
        _frames: &'a FrameSequence,
        _fps: u32,
        _output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), EncodeError>> + Send + 'a>> {
        Box::pin(async {
            Err(EncodeError::ProcessFailed {
                status: "exit status: 1".to_string(),
                stderr: "Unknown encoder 'libx264'".to_string(),
            })
        })
    }

    fn stitch<'a>(
        &'a self,
        _grid: &'a ClipGrid,
        _fps: u32,
        _output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), StitchError>> + Send + 'a>> {
        Box::pin(async { Err(StitchError::EmptyGrid) })
    }
}

fn service<C: AsyncHttpClient>(
    client: C,
    encoder: Arc<dyn ClipEncoder>,
    root: &Path,
    settings: RenderSettings,
) -> AnimationService<C> {
    let config = ServiceConfig::new(root.join("out"), root.join("work"))
        .with_settings(settings)
        .with_url_prefix("/files");
    AnimationService::new(
        client,
        TileSource::new(TEMPLATE, 2).unwrap(),
        encoder,
        Arc::new(InMemoryJobStore::new()),
        config,
    )
}

fn decode_gif(path: &Path) -> Vec<RgbaImage> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
    decoder
        .into_frames()
        .collect_frames()
        .unwrap()
        .into_iter()
        .map(|f| f.into_buffer())
        .collect()
}

fn work_dir_is_empty(root: &Path) -> bool {
    match std::fs::read_dir(root.join("work")) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

fn small_request(end: &str) -> AnimationRequest {
    AnimationRequest::new([-1.0, -1.0, 1.0, 1.0], "2020-01-01", end)
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_all_tiles_missing_still_completes() {
    let temp = tempfile::TempDir::new().unwrap();
    let settings = RenderSettings::default().with_placeholder_color(MAGENTA);
    let service = service(
        MissingTiles,
        Arc::new(GifClipEncoder::new()),
        temp.path(),
        settings,
    );

    let id = service.submit(&small_request("2020-01-03")).await.unwrap();
    let job = service.wait(&id, POLL).await.unwrap();

    assert_eq!(job.status, JobStatus::Complete, "error: {:?}", job.error);
    let url = job.url.unwrap();
    assert_eq!(url, format!("/files/{}.gif", id));

    let artifact = temp.path().join("out").join(format!("{}.gif", id));
    let frames = decode_gif(&artifact);
    assert_eq!(frames.len(), 3);
    for frame in &frames {
        assert_eq!(frame.dimensions(), (1024, 1024));
        assert_eq!(*frame.get_pixel(0, 0), MAGENTA);
        assert_eq!(*frame.get_pixel(1023, 1023), MAGENTA);
    }

    assert!(work_dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_multi_batch_render_is_stitched_in_place() {
    let temp = tempfile::TempDir::new().unwrap();
    let settings = RenderSettings::default()
        .with_tile_size(8)
        .with_max_batch_dim(1)
        .with_placeholder_color(MAGENTA);
    let service = service(
        ColoredTiles { tile_size: 8 },
        Arc::new(GifClipEncoder::new()),
        temp.path(),
        settings,
    );

    let request = small_request("2020-01-02");
    let plan = service.plan(&request).unwrap();
    assert_eq!((plan.grid.rows(), plan.grid.cols()), (2, 2));

    let id = service.submit(&request).await.unwrap();
    let job = service.wait(&id, POLL).await.unwrap();
    assert_eq!(job.status, JobStatus::Complete, "error: {:?}", job.error);

    let frames = decode_gif(&temp.path().join("out").join(format!("{}.gif", id)));
    assert_eq!(frames.len(), 2);
    for frame in &frames {
        assert_eq!(frame.dimensions(), (16, 16));
        assert_eq!(*frame.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*frame.get_pixel(15, 0), Rgba([0, 255, 0, 255]));
        assert_eq!(*frame.get_pixel(0, 15), Rgba([0, 0, 255, 255]));
        assert_eq!(*frame.get_pixel(15, 15), MAGENTA);
    }

    assert!(work_dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_encoder_failure_fails_job_and_cleans_up() {
    let temp = tempfile::TempDir::new().unwrap();
    let service = service(
        MissingTiles,
        Arc::new(FailingEncoder),
        temp.path(),
        RenderSettings::default().with_tile_size(8),
    );

    let id = service.submit(&small_request("2020-01-02")).await.unwrap();
    let job = service.wait(&id, POLL).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.url.is_none());
    let error = job.error.unwrap();
    assert!(!error.is_empty());
    assert!(error.contains("libx264"));

    assert!(work_dir_is_empty(temp.path()));
    assert!(!temp.path().join("out").join(format!("{}.mp4", id)).exists());
}

#[tokio::test]
async fn test_cancelled_job_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    let service = service(
        SlowTiles,
        Arc::new(GifClipEncoder::new()),
        temp.path(),
        RenderSettings::default().with_tile_size(8),
    );

    let id = service.submit(&small_request("2020-01-20")).await.unwrap();
    assert!(service.cancel(&id));

    let job = service.wait(&id, POLL).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("cancelled"));
    assert!(work_dir_is_empty(temp.path()));
}

#[tokio::test]
async fn test_status_is_processing_before_completion() {
    let temp = tempfile::TempDir::new().unwrap();
    let service = service(
        SlowTiles,
        Arc::new(GifClipEncoder::new()),
        temp.path(),
        RenderSettings::default().with_tile_size(8),
    );

    let id = service.submit(&small_request("2020-01-05")).await.unwrap();
    let job = service.status(&id).unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert!(job.url.is_none() && job.error.is_none());

    service.cancel(&id);
    service.wait(&id, POLL).await.unwrap();
}
