//! Render command - build one animation and wait for it.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tilereel::job::{AnimationJob, JobId, JobStatus};
use tracing::{info, warn};

use super::common::RequestArgs;
use crate::error::CliError;
use crate::runner::{CliRunner, CliService};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Arguments for the render command.
pub struct RenderArgs {
    pub request: RequestArgs,
    pub output_dir: Option<PathBuf>,
}

/// Run the render command.
pub fn run(config_path: Option<&Path>, args: RenderArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    runner.log_startup("render");

    let service_config = runner.service_config(args.output_dir);
    let output_dir = service_config.output_dir().to_path_buf();
    let request = args.request.to_request();

    let runtime = runner.runtime()?;
    let job = runtime.block_on(async {
        let service = runner.create_service(service_config)?;
        let id = service.submit(&request).await?;
        println!("Job {} submitted", id);
        Ok::<_, CliError>(wait_with_interrupt(&service, &id).await)
    })?;

    match job {
        Some(job) => report(job, &output_dir),
        None => Err(CliError::Config("job record disappeared".to_string())),
    }
}

/// Waits for the job, cancelling it on Ctrl-C and then waiting for the
/// cancellation to land.
async fn wait_with_interrupt(service: &CliService, id: &JobId) -> Option<AnimationJob> {
    let start = Instant::now();
    tokio::select! {
        job = service.wait(id, POLL_INTERVAL) => {
            info!(job_id = %id, elapsed_secs = start.elapsed().as_secs_f64(), "Render finished");
            job
        }
        _ = tokio::signal::ctrl_c() => {
            warn!(job_id = %id, "Interrupted, cancelling job");
            println!("Interrupted, cancelling...");
            service.cancel(id);
            service.wait(id, POLL_INTERVAL).await
        }
    }
}

fn report(job: AnimationJob, output_dir: &Path) -> Result<(), CliError> {
    match job.status {
        JobStatus::Complete => {
            let url = job.url.unwrap_or_default();
            let file = url.rsplit('/').next().unwrap_or_default();
            println!("Complete: {}", output_dir.join(file).display());
            println!("  URL: {}", url);
            Ok(())
        }
        _ => Err(CliError::JobFailed {
            job_id: job.id.to_string(),
            reason: job.error.unwrap_or_else(|| "unknown error".to_string()),
        }),
    }
}
