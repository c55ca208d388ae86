// src/dag/root_set.rs

//! The explicitly registered jobs of a scheduler.

use std::collections::HashSet;

use crate::job::{JobHandle, JobKey};

/// Insertion-ordered set of job handles, keyed by identity.
#[derive(Default)]
pub struct RootSet {
    jobs: Vec<JobHandle>,
    keys: HashSet<JobKey>,
}

impl RootSet {
    /// Returns `false` if `job` was already present.
    pub fn insert(&mut self, job: JobHandle) -> bool {
        if !self.keys.insert(JobKey::of(&job)) {
            return false;
        }
        self.jobs.push(job);
        true
    }

    /// Returns `false` if `job` was not present.
    pub fn remove(&mut self, job: &JobHandle) -> bool {
        let key = JobKey::of(job);
        if !self.keys.remove(&key) {
            return false;
        }
        self.jobs.retain(|j| JobKey::of(j) != key);
        true
    }

    pub fn contains(&self, job: &JobHandle) -> bool {
        self.keys.contains(&JobKey::of(job))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Copy of the current members, in insertion order.
    pub fn snapshot(&self) -> Vec<JobHandle> {
        self.jobs.clone()
    }
}
