//! Job record storage.

use super::types::{AnimationJob, JobId, JobStatus};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Why [`JobStore::transition`] left a record untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionRefused {
    #[error("no such job")]
    Missing,

    #[error("job is already {0}")]
    Terminal(JobStatus),
}

/// Key-value store for job records.
///
/// Readers may observe any published state; a write replaces the whole
/// record so partial updates are never visible.
pub trait JobStore: Send + Sync + 'static {
    fn get(&self, id: &JobId) -> Option<AnimationJob>;

    fn set(&self, job: AnimationJob);

    /// Inserts `job` only if no record exists for its ID. Returns false if
    /// one already did.
    fn insert_new(&self, job: AnimationJob) -> bool;

    /// Replaces the record for `next.id` only while it is still
    /// processing. The check and the write are one atomic step.
    fn transition(&self, next: AnimationJob) -> Result<(), TransitionRefused>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store backed by a concurrent map.
///
/// [`InMemoryJobStore::new`] keeps every record for the life of the
/// process. A long-running server should use
/// [`InMemoryJobStore::with_retention`], which bounds how many finished
/// jobs stay pollable. Processing jobs are never evicted.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<JobId, AnimationJob>,
    retain_finished: Option<usize>,
    finished: Mutex<VecDeque<JobId>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `max_finished` terminal records, dropping the ones
    /// that finished earliest.
    pub fn with_retention(max_finished: usize) -> Self {
        Self {
            retain_finished: Some(max_finished),
            ..Self::default()
        }
    }

    fn record_finished(&self, id: JobId) {
        let Some(limit) = self.retain_finished else {
            return;
        };
        let evicted: Vec<JobId> = {
            let mut finished = self.finished.lock().unwrap_or_else(|e| e.into_inner());
            finished.push_back(id);
            let excess = finished.len().saturating_sub(limit);
            finished.drain(..excess).collect()
        };
        for id in evicted {
            self.jobs.remove_if(&id, |_, job| job.is_terminal());
            debug!(job_id = %id, "Evicted finished job");
        }
    }
}

impl JobStore for InMemoryJobStore {
    fn get(&self, id: &JobId) -> Option<AnimationJob> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    fn set(&self, job: AnimationJob) {
        self.jobs.insert(job.id.clone(), job);
    }

    fn insert_new(&self, job: AnimationJob) -> bool {
        match self.jobs.entry(job.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(job);
                true
            }
        }
    }

    fn transition(&self, next: AnimationJob) -> Result<(), TransitionRefused> {
        let id = next.id.clone();
        let finished = next.is_terminal();
        // The entry guard holds its shard lock; release it before eviction
        // touches other keys.
        match self.jobs.entry(id.clone()) {
            Entry::Vacant(_) => return Err(TransitionRefused::Missing),
            Entry::Occupied(mut slot) => {
                let current = slot.get().status;
                if current.is_terminal() {
                    return Err(TransitionRefused::Terminal(current));
                }
                slot.insert(next);
            }
        }
        if finished {
            self.record_finished(id);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}
