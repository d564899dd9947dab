//! Job state transitions and guaranteed cleanup.
//!
//! Every job moves `processing -> complete` or `processing -> failed`
//! exactly once. [`JobLifecycleManager::run`] is the single boundary where
//! render failures, including panics, are turned into a failed record; the
//! job's workspace is removed before the terminal state is published.

use super::store::{JobStore, TransitionRefused};
use super::types::{AnimationJob, JobId, JobStatus};
use super::workspace::JobWorkspace;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Unknown job {0}")]
    UnknownJob(JobId),

    #[error("Job {0} already exists")]
    AlreadyExists(JobId),

    #[error("Job {id} is already {status}")]
    AlreadyTerminal { id: JobId, status: JobStatus },
}

/// Owns job records and enforces their state machine.
#[derive(Clone)]
pub struct JobLifecycleManager {
    store: Arc<dyn JobStore>,
}

impl JobLifecycleManager {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Current record for `id`.
    pub fn get(&self, id: &JobId) -> Option<AnimationJob> {
        self.store.get(id)
    }

    /// Records a new job as processing.
    pub fn begin(&self, id: &JobId) -> Result<AnimationJob, LifecycleError> {
        let job = AnimationJob::processing(id.clone());
        if !self.store.insert_new(job.clone()) {
            return Err(LifecycleError::AlreadyExists(id.clone()));
        }
        info!(job_id = %id, "Job started");
        Ok(job)
    }

    /// Marks the job complete with the artifact URL.
    pub fn complete(&self, id: &JobId, url: impl Into<String>) -> Result<AnimationJob, LifecycleError> {
        self.finish(AnimationJob::complete(id.clone(), url))
    }

    /// Marks the job failed with a human-readable reason.
    pub fn fail(&self, id: &JobId, reason: impl Into<String>) -> Result<AnimationJob, LifecycleError> {
        self.finish(AnimationJob::failed(id.clone(), reason))
    }

    fn finish(&self, next: AnimationJob) -> Result<AnimationJob, LifecycleError> {
        match self.store.transition(next.clone()) {
            Ok(()) => {}
            Err(TransitionRefused::Missing) => return Err(LifecycleError::UnknownJob(next.id)),
            Err(TransitionRefused::Terminal(current)) => {
                error!(
                    job_id = %next.id,
                    current = %current,
                    attempted = %next.status,
                    "Refusing second terminal transition"
                );
                return Err(LifecycleError::AlreadyTerminal {
                    id: next.id,
                    status: current,
                });
            }
        }

        match next.status {
            JobStatus::Complete => info!(
                job_id = %next.id,
                url = next.url.as_deref().unwrap_or_default(),
                "Job complete"
            ),
            _ => warn!(
                job_id = %next.id,
                error = next.error.as_deref().unwrap_or_default(),
                "Job failed"
            ),
        }
        Ok(next)
    }

    /// Runs `work` for a job that has already begun, then cleans up.
    ///
    /// `work` resolves to the artifact URL. Its error, or a panic inside it,
    /// fails the job. The workspace is removed on every path before the
    /// terminal state is written, so a client that sees a terminal status
    /// never finds scratch files left behind.
    pub async fn run<F, Fut, E>(
        &self,
        id: &JobId,
        workspace: JobWorkspace,
        work: F,
    ) -> Result<AnimationJob, LifecycleError>
    where
        F: FnOnce(JobWorkspace) -> Fut + Send,
        Fut: Future<Output = Result<String, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let handle = tokio::spawn(work(workspace.clone()));

        let outcome = match handle.await {
            Ok(Ok(url)) => Ok(url),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) if e.is_panic() => {
                error!(job_id = %id, "Render task panicked");
                Err("internal error: render task panicked".to_string())
            }
            Err(_) => Err("render task was aborted".to_string()),
        };

        if let Err(e) = workspace.cleanup().await {
            warn!(
                job_id = %id,
                root = %workspace.root().display(),
                error = %e,
                "Failed to remove job workspace"
            );
        }

        match outcome {
            Ok(url) => self.complete(id, url),
            Err(reason) => self.fail(id, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::InMemoryJobStore;

    fn manager() -> JobLifecycleManager {
        JobLifecycleManager::new(Arc::new(InMemoryJobStore::new()))
    }

    #[test]
    fn test_begin_then_complete() {
        let lifecycle = manager();
        let id = JobId::new("1-0");

        let job = lifecycle.begin(&id).unwrap();
        assert_eq!(job.status, JobStatus::Processing);

        let job = lifecycle.complete(&id, "/files/1-0.gif").unwrap();
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(lifecycle.get(&id), Some(job));
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let lifecycle = manager();
        let id = JobId::new("1-0");
        lifecycle.begin(&id).unwrap();
        assert_eq!(
            lifecycle.begin(&id),
            Err(LifecycleError::AlreadyExists(id.clone()))
        );
    }

    #[test]
    fn test_second_terminal_write_is_rejected() {
        let lifecycle = manager();
        let id = JobId::new("1-0");
        lifecycle.begin(&id).unwrap();
        lifecycle.fail(&id, "first").unwrap();

        let result = lifecycle.complete(&id, "/files/late.gif");
        assert_eq!(
            result,
            Err(LifecycleError::AlreadyTerminal {
                id: id.clone(),
                status: JobStatus::Failed
            })
        );

        let job = lifecycle.get(&id).unwrap();
        assert_eq!(job.error.as_deref(), Some("first"));
        assert!(job.url.is_none());
    }

    #[test]
    fn test_concurrent_finishers_publish_once() {
        let lifecycle = manager();
        let id = JobId::new("1-3");
        lifecycle.begin(&id).unwrap();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let lifecycle = lifecycle.clone();
                    let id = id.clone();
                    scope.spawn(move || {
                        if i % 2 == 0 {
                            lifecycle.complete(&id, format!("/files/{}.gif", i))
                        } else {
                            lifecycle.fail(&id, format!("writer {}", i))
                        }
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LifecycleError::AlreadyTerminal { .. })));
        assert_eq!(lifecycle.get(&id).as_ref(), Some(winners[0]));
    }

    #[test]
    fn test_unknown_job() {
        let result = manager().fail(&JobId::new("nope"), "x");
        assert!(matches!(result, Err(LifecycleError::UnknownJob(_))));
    }

    #[tokio::test]
    async fn test_run_success_cleans_workspace() {
        let temp = tempfile::TempDir::new().unwrap();
        let lifecycle = manager();
        let id = JobId::new("1-0");
        lifecycle.begin(&id).unwrap();
        let workspace = JobWorkspace::create(temp.path(), &id).unwrap();
        let root = workspace.root().to_path_buf();

        let job = lifecycle
            .run(&id, workspace, |ws| async move {
                tokio::fs::write(ws.root().join("scratch"), b"x")
                    .await
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>("/files/1-0.gif".to_string())
            })
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Complete);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_run_failure_records_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let lifecycle = manager();
        let id = JobId::new("1-1");
        lifecycle.begin(&id).unwrap();
        let workspace = JobWorkspace::create(temp.path(), &id).unwrap();
        let root = workspace.root().to_path_buf();

        let job = lifecycle
            .run(&id, workspace, |_| async {
                Err::<String, _>("encoder exited with status 1")
            })
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("encoder exited with status 1"));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_run_panic_fails_job() {
        let temp = tempfile::TempDir::new().unwrap();
        let lifecycle = manager();
        let id = JobId::new("1-2");
        lifecycle.begin(&id).unwrap();
        let workspace = JobWorkspace::create(temp.path(), &id).unwrap();

        let job = lifecycle
            .run(&id, workspace, |_| async {
                if true {
                    panic!("boom");
                }
                Ok::<String, String>(String::new())
            })
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("panicked"));
    }
}
