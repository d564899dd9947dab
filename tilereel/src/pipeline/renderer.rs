//! Batch-by-batch render driver.

use super::error::RenderError;
use super::plan::RenderPlan;
use crate::batch::Batch;
use crate::compositor::{FetchSummary, FrameCompositor};
use crate::config::RenderSettings;
use crate::encode::{BatchClip, BatchEncoder, ClipEncoder, ClipGrid, FinalStitcher, FrameSequence};
use crate::fetch::TileFetcher;
use crate::job::{JobId, JobWorkspace};
use crate::provider::{AsyncHttpClient, TileSource};
use crate::recipe::Recipe;
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Drives one job from plan to final artifact.
///
/// Batches run one after another and days within a batch run in order, so
/// at most one batch's tiles are in flight at any time. Each batch's
/// frames are deleted as soon as its clip is encoded.
pub struct AnimationRenderer<C> {
    compositor: FrameCompositor<C>,
    batch_encoder: BatchEncoder,
    stitcher: FinalStitcher,
}

impl<C: AsyncHttpClient> AnimationRenderer<C> {
    pub fn new(
        client: Arc<C>,
        source: TileSource,
        encoder: Arc<dyn ClipEncoder>,
        settings: &RenderSettings,
    ) -> Self {
        let fetcher = Arc::new(TileFetcher::new(client, source, settings));
        Self {
            compositor: FrameCompositor::new(fetcher, settings.placeholder_color()),
            batch_encoder: BatchEncoder::new(Arc::clone(&encoder), settings.fps(), settings.tile_size()),
            stitcher: FinalStitcher::new(encoder, settings.fps()),
        }
    }

    /// Artifact extension of the configured encoder.
    pub fn extension(&self) -> &'static str {
        self.batch_encoder.extension()
    }

    /// Renders `plan` into `output`, using `workspace` for scratch files.
    ///
    /// `cancel` is checked before every batch and every day.
    #[instrument(skip_all, fields(job_id = %job_id, batches = plan.grid.len(), days = plan.dates.len()))]
    pub async fn render(
        &self,
        job_id: &JobId,
        plan: &RenderPlan,
        workspace: &JobWorkspace,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, RenderError> {
        info!(
            tiles = plan.rect.tile_count(),
            recipe = plan.recipe.name(),
            "Render started"
        );

        let mut clips = Vec::with_capacity(plan.grid.len());
        let mut totals = FetchSummary::default();

        for batch in plan.grid.batches() {
            if cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
            let (clip, summary) = self.render_batch(batch, plan, workspace, cancel).await?;
            totals.fetched += summary.fetched;
            totals.placeholders += summary.placeholders;
            clips.push(clip);
        }

        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let grid = ClipGrid::new(plan.grid.rows(), plan.grid.cols(), clips);
        let staging = workspace.staging_path(self.extension());
        let artifact = self.stitcher.stitch(&grid, &staging, output).await?;

        info!(
            output = %artifact.display(),
            fetched = totals.fetched,
            placeholders = totals.placeholders,
            "Render finished"
        );
        Ok(artifact)
    }

    async fn render_batch(
        &self,
        batch: &Batch,
        plan: &RenderPlan,
        workspace: &JobWorkspace,
        cancel: &CancellationToken,
    ) -> Result<(BatchClip, FetchSummary), RenderError> {
        let tiles_dir = workspace.tiles_dir(batch);
        let frames_dir = workspace.frames_dir(batch);
        tokio::fs::create_dir_all(&frames_dir).await?;

        let mut summary = FetchSummary::default();
        for (index, date) in plan.dates.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }

            let frame = self.compositor.compose(batch, date, &tiles_dir).await?;
            summary.fetched += frame.summary.fetched;
            summary.placeholders += frame.summary.placeholders;

            let path = frames_dir.join(FrameSequence::file_name(index));
            write_frame(frame.image, plan.recipe, path, index).await?;
        }

        let frames = FrameSequence::new(&frames_dir, plan.dates.len());
        let clip = self
            .batch_encoder
            .encode(batch, &frames, &workspace.clips_dir())
            .await?;

        let batch_dir = workspace.batch_dir(batch);
        if let Err(e) = tokio::fs::remove_dir_all(&batch_dir).await {
            warn!(dir = %batch_dir.display(), error = %e, "Failed to remove batch scratch directory");
        }

        info!(
            batch = %batch.label(),
            tiles = batch.tile_count(),
            placeholders = summary.placeholders,
            "Batch complete"
        );
        Ok((clip, summary))
    }
}

/// Applies the recipe and writes one frame as PNG on the blocking pool.
async fn write_frame(
    mut image: RgbaImage,
    recipe: Recipe,
    path: PathBuf,
    index: usize,
) -> Result<(), RenderError> {
    tokio::task::spawn_blocking(move || {
        recipe.apply(&mut image);
        image.save_with_format(&path, ImageFormat::Png)
    })
    .await
    .map_err(|e| RenderError::Internal(e.to_string()))?
    .map_err(|e| RenderError::FrameWrite {
        index,
        message: e.to_string(),
    })
}
