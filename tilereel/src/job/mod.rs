//! Animation job tracking.
//!
//! - [`JobId`], [`JobStatus`], [`AnimationJob`] - the records clients poll
//! - [`JobStore`] - where records live ([`InMemoryJobStore`] by default)
//! - [`JobLifecycleManager`] - the only writer of records
//! - [`JobWorkspace`] - per-job scratch tree, removed on every exit path

mod lifecycle;
mod store;
mod types;
mod workspace;

pub use lifecycle::{JobLifecycleManager, LifecycleError};
pub use store::{InMemoryJobStore, JobStore, TransitionRefused};
pub use types::{AnimationJob, JobId, JobStatus};
pub use workspace::JobWorkspace;
