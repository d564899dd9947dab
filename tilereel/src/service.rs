//! Asynchronous animation service.
//!
//! [`AnimationService`] is the entry point used by the CLI and the HTTP
//! server: it validates requests, mints job IDs, runs renders in the
//! background and answers status queries.
//!
//! ```ignore
//! let service = AnimationService::new(client, source, encoder, store, config);
//! let id = service.submit(&request).await?;
//! let job = service.wait(&id, Duration::from_millis(500)).await;
//! ```

use crate::config::{ConfigFile, RenderSettings};
use crate::encode::ClipEncoder;
use crate::job::{AnimationJob, JobId, JobLifecycleManager, JobStore, JobWorkspace, LifecycleError};
use crate::pipeline::{AnimationRenderer, RenderError, RenderPlan};
use crate::provider::{AsyncHttpClient, TileSource};
use crate::recipe::RecipeRegistry;
use crate::request::{AnimationRequest, RequestError};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Where artifacts and scratch files go, and how artifacts are addressed.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    settings: RenderSettings,
    output_dir: PathBuf,
    work_dir: PathBuf,
    url_prefix: String,
}

impl ServiceConfig {
    pub fn new(output_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings: RenderSettings::default(),
            output_dir: output_dir.into(),
            work_dir: work_dir.into(),
            url_prefix: crate::config::DEFAULT_URL_PREFIX.to_string(),
        }
    }

    /// Builds a service configuration from the loaded config file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self::new(&config.output.directory, &config.output.work_dir)
            .with_settings(config.render_settings())
            .with_url_prefix(&config.output.url_prefix)
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the URL prefix; a trailing `/` is dropped.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// `<output_dir>/<job_id>.<ext>`
    pub fn artifact_path(&self, id: &JobId, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", id, extension))
    }

    /// `<url_prefix>/<job_id>.<ext>`
    pub fn artifact_url(&self, id: &JobId, extension: &str) -> String {
        format!("{}/{}.{}", self.url_prefix, id, extension)
    }
}

/// Errors from [`AnimationService::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request itself is invalid; nothing was created
    #[error(transparent)]
    Invalid(#[from] RequestError),

    /// The job record could not be created
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

struct ServiceInner<C> {
    renderer: AnimationRenderer<C>,
    lifecycle: JobLifecycleManager,
    recipes: RecipeRegistry,
    zoom: u8,
    config: ServiceConfig,
    cancellations: DashMap<JobId, CancellationToken>,
}

/// Accepts animation requests and renders them in the background.
///
/// Cloning is cheap; clones share jobs and configuration.
pub struct AnimationService<C> {
    inner: Arc<ServiceInner<C>>,
}

impl<C> Clone for AnimationService<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: AsyncHttpClient> AnimationService<C> {
    pub fn new(
        client: C,
        source: TileSource,
        encoder: Arc<dyn ClipEncoder>,
        store: Arc<dyn JobStore>,
        config: ServiceConfig,
    ) -> Self {
        let zoom = source.zoom();
        let renderer = AnimationRenderer::new(Arc::new(client), source, encoder, config.settings());
        Self {
            inner: Arc::new(ServiceInner {
                renderer,
                lifecycle: JobLifecycleManager::new(store),
                recipes: RecipeRegistry::with_builtin(),
                zoom,
                config,
                cancellations: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn recipes(&self) -> &RecipeRegistry {
        &self.inner.recipes
    }

    /// Validates `request` and returns the render plan without starting work.
    pub fn plan(&self, request: &AnimationRequest) -> Result<RenderPlan, RequestError> {
        RenderPlan::build(
            request,
            self.inner.zoom,
            self.inner.config.settings(),
            &self.inner.recipes,
        )
    }

    /// Validates `request`, records a processing job and starts rendering.
    ///
    /// Returns as soon as the job is recorded; poll [`status`](Self::status)
    /// for progress. Must be called inside a Tokio runtime.
    pub async fn submit(&self, request: &AnimationRequest) -> Result<JobId, SubmitError> {
        let plan = self.plan(request)?;
        let id = JobId::generate();
        self.inner.lifecycle.begin(&id)?;

        let token = CancellationToken::new();
        self.inner.cancellations.insert(id.clone(), token.clone());

        info!(
            job_id = %id,
            bbox = ?plan.bbox.to_array(),
            days = plan.dates.len(),
            tiles = plan.rect.tile_count(),
            batches = plan.grid.len(),
            "Animation job accepted"
        );

        let inner = Arc::clone(&self.inner);
        let job_id = id.clone();
        tokio::spawn(async move { inner.execute(job_id, plan, token).await });

        Ok(id)
    }

    /// Current record for `id`, if the job exists.
    pub fn status(&self, id: &JobId) -> Option<AnimationJob> {
        self.inner.lifecycle.get(id)
    }

    /// Requests cancellation. Returns false if the job is unknown or done.
    pub fn cancel(&self, id: &JobId) -> bool {
        match self.inner.cancellations.get(id) {
            Some(token) => {
                info!(job_id = %id, "Cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Polls until the job reaches a terminal state.
    ///
    /// Returns `None` if the job does not exist.
    pub async fn wait(&self, id: &JobId, poll_interval: Duration) -> Option<AnimationJob> {
        loop {
            let job = self.status(id)?;
            if job.is_terminal() {
                return Some(job);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

impl<C: AsyncHttpClient> ServiceInner<C> {
    async fn execute(self: Arc<Self>, id: JobId, plan: RenderPlan, cancel: CancellationToken) {
        let workspace = match JobWorkspace::create(self.config.work_dir(), &id) {
            Ok(workspace) => workspace,
            Err(e) => {
                if let Err(e) = self
                    .lifecycle
                    .fail(&id, format!("failed to create working directory: {}", e))
                {
                    error!(job_id = %id, error = %e, "Could not record job failure");
                }
                self.cancellations.remove(&id);
                return;
            }
        };

        let extension = self.renderer.extension();
        let output = self.config.artifact_path(&id, extension);
        let url = self.config.artifact_url(&id, extension);

        let inner = Arc::clone(&self);
        let job_id = id.clone();
        let result = self
            .lifecycle
            .run(&id, workspace, move |workspace| async move {
                inner
                    .renderer
                    .render(&job_id, &plan, &workspace, &output, &cancel)
                    .await?;
                Ok::<_, RenderError>(url)
            })
            .await;

        self.cancellations.remove(&id);
        if let Err(e) = result {
            error!(job_id = %id, error = %e, "Could not record job outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::GifClipEncoder;
    use crate::job::{InMemoryJobStore, JobStatus};
    use crate::provider::MockAsyncHttpClient;

    fn service(temp: &Path) -> AnimationService<MockAsyncHttpClient> {
        let config = ServiceConfig::new(temp.join("out"), temp.join("work"))
            .with_settings(RenderSettings::default().with_tile_size(8))
            .with_url_prefix("http://localhost:8080/files/");
        AnimationService::new(
            MockAsyncHttpClient::not_found(),
            TileSource::new("http://t/{date}/{z}/{x}/{y}.png", 2).unwrap(),
            Arc::new(GifClipEncoder::new()),
            Arc::new(InMemoryJobStore::new()),
            config,
        )
    }

    #[test]
    fn test_artifact_naming() {
        let config = ServiceConfig::new("/srv/out", "/tmp").with_url_prefix("/files/");
        let id = JobId::new("17-3");
        assert_eq!(config.artifact_path(&id, "gif"), PathBuf::from("/srv/out/17-3.gif"));
        assert_eq!(config.artifact_url(&id, "mp4"), "/files/17-3.mp4");
    }

    #[tokio::test]
    async fn test_submit_invalid_request_creates_nothing() {
        let temp = tempfile::TempDir::new().unwrap();
        let service = service(temp.path());
        let result = service
            .submit(&AnimationRequest::new([0.0, 0.0, 1.0, 1.0], "2020-01-02", "2020-01-01"))
            .await;
        assert!(matches!(result, Err(SubmitError::Invalid(RequestError::InvalidDates(_)))));
    }

    #[tokio::test]
    async fn test_submit_completes_with_url() {
        let temp = tempfile::TempDir::new().unwrap();
        let service = service(temp.path());
        let id = service
            .submit(&AnimationRequest::new([-1.0, -1.0, 1.0, 1.0], "2020-01-01", "2020-01-02"))
            .await
            .unwrap();

        let job = service.wait(&id, Duration::from_millis(20)).await.unwrap();
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(
            job.url.as_deref(),
            Some(format!("http://localhost:8080/files/{}.gif", id).as_str())
        );
        assert!(temp.path().join("out").join(format!("{}.gif", id)).exists());
    }

    #[tokio::test]
    async fn test_unknown_job_status() {
        let temp = tempfile::TempDir::new().unwrap();
        let service = service(temp.path());
        assert!(service.status(&JobId::new("missing")).is_none());
        assert!(service
            .wait(&JobId::new("missing"), Duration::from_millis(1))
            .await
            .is_none());
    }
}
