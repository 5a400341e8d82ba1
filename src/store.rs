use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::job::{Job, JobId};

/// Shared table of job snapshots.
///
/// Readers get an `Arc` to a whole snapshot; writers swap in a new snapshot
/// under the write lock, so a reader never sees half of a transition.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, Arc<Job>>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) -> Arc<Job> {
        let job = Arc::new(job);
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.job_id.clone(), job.clone());
        job
    }

    pub fn get(&self, job_id: &str) -> Option<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<Arc<Job>> {
        let mut jobs: Vec<Arc<Job>> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.job_id.cmp(&b.job_id)));
        jobs
    }

    pub fn remove(&self, job_id: &str) -> Option<Arc<Job>> {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the snapshot for `job_id` with `transition(current)` in one
    /// critical section. Returns `Ok(None)` when the job no longer exists.
    pub fn update<F>(&self, job_id: &str, transition: F) -> Result<Option<Arc<Job>>>
    where
        F: FnOnce(&Job) -> Result<Job>,
    {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = jobs.get(job_id) else {
            return Ok(None);
        };
        let next = Arc::new(transition(current)?);
        jobs.insert(job_id.to_string(), next.clone());
        Ok(Some(next))
    }
}
