//! Per-job temporary directory tree.
//!
//! ```text
//! <work_dir>/tilereel-<job_id>-XXXXXX/
//!     batch_<r>_<c>/
//!         tiles/<YYYY-MM-DD>/<x>_<y>.png
//!         frames/frame_<nnnnn>.png
//!     clips/batch_<r>_<c>.<ext>
//!     final.<ext>
//! ```

use super::types::JobId;
use crate::batch::Batch;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Uniquely named scratch directory for one job.
///
/// Clones refer to the same directory. Nothing is removed on drop; the
/// lifecycle manager calls [`JobWorkspace::cleanup`] on every exit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobWorkspace {
    root: PathBuf,
}

impl JobWorkspace {
    /// Creates a fresh directory under `work_dir`.
    pub fn create(work_dir: &Path, job_id: &JobId) -> io::Result<Self> {
        std::fs::create_dir_all(work_dir)?;
        let root = tempfile::Builder::new()
            .prefix(&format!("tilereel-{}-", job_id))
            .tempdir_in(work_dir)?
            .keep();
        debug!(job_id = %job_id, root = %root.display(), "Job workspace created");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn batch_dir(&self, batch: &Batch) -> PathBuf {
        self.root.join(batch.label())
    }

    /// Staging area for raw tiles, one subdirectory per day.
    pub fn tiles_dir(&self, batch: &Batch) -> PathBuf {
        self.batch_dir(batch).join("tiles")
    }

    pub fn frames_dir(&self, batch: &Batch) -> PathBuf {
        self.batch_dir(batch).join("frames")
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.root.join("clips")
    }

    /// Where the stitched artifact is written before it is published.
    pub fn staging_path(&self, extension: &str) -> PathBuf {
        self.root.join(format!("final.{}", extension))
    }

    /// Removes the whole tree. A tree that is already gone is not an error.
    pub async fn cleanup(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
