// src/job/mod.rs

//! The schedulable unit of work.
//!
//! Anything that wants to run once per scheduler cycle implements [`Job`] and
//! is handed to [`Scheduler::add`](crate::dag::Scheduler::add) as a
//! [`JobHandle`]. Jobs are shared (`Arc`) rather than owned by the scheduler,
//! so one job may be registered with several schedulers, be a dependency of
//! several other jobs, and live across many cycles.
//!
//! - [`shared`] has wrappers for jobs shared between schedulers.
//! - [`cache`] hands out one job instance per key (per-context singletons).

pub mod cache;
pub mod shared;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::pool::round::lock;

pub use cache::JobCache;
pub use shared::{DirtyJob, Exclusive};

/// A unit of work executed at most once per scheduler cycle.
///
/// Jobs must be `Send + Sync`: `execute` may run on any pool worker, and
/// not necessarily the same one from cycle to cycle.
pub trait Job: Send + Sync {
    /// Perform this cycle's work.
    ///
    /// Called after every dependency reported in this cycle has finished its
    /// own `execute`.
    fn execute(&self);

    /// Report the jobs this job depends on in the current cycle.
    ///
    /// Called once per cycle, before any job executes. The reported set may
    /// change from cycle to cycle and may contain jobs that were never added
    /// to the scheduler; those are pulled into the graph too.
    fn collect_dependencies(&self, _deps: &mut DependencySink<'_>) {}

    /// Name used in diagnostics (cycle errors, fault logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a job, as stored by schedulers and dependents.
pub type JobHandle = Arc<dyn Job>;

/// Identity of a job handle (address of the shared allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey(usize);

impl JobKey {
    pub fn of(job: &JobHandle) -> Self {
        JobKey(Arc::as_ptr(job) as *const () as usize)
    }
}

/// Collects the dependencies a job reports during discovery.
///
/// Reporting the same job more than once in one call is a no-op after the
/// first report.
pub struct DependencySink<'a> {
    seen: &'a mut HashSet<JobKey>,
    reported: &'a mut Vec<JobHandle>,
}

impl<'a> DependencySink<'a> {
    pub(crate) fn new(seen: &'a mut HashSet<JobKey>, reported: &'a mut Vec<JobHandle>) -> Self {
        Self { seen, reported }
    }

    /// Declare that the reporting job depends on `job` this cycle.
    pub fn report(&mut self, job: JobHandle) {
        if self.seen.insert(JobKey::of(&job)) {
            self.reported.push(job);
        }
    }

    /// Number of distinct dependencies reported so far.
    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }
}

/// A [`Job`] backed by a closure.
///
/// Dependencies are kept in a list that can be edited between cycles with
/// [`FnJob::depend_on`] and [`FnJob::clear_dependencies`].
pub struct FnJob<F>
where
    F: Fn() + Send + Sync + 'static,
{
    name: String,
    dependencies: Mutex<Vec<JobHandle>>,
    f: F,
}

impl<F> FnJob<F>
where
    F: Fn() + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            dependencies: Mutex::new(Vec::new()),
            f,
        }
    }

    /// Add `job` to the dependencies reported from the next cycle on.
    pub fn depend_on(&self, job: JobHandle) {
        lock(&self.dependencies).push(job);
    }

    /// Remove every occurrence of `job` from the dependency list.
    pub fn remove_dependency(&self, job: &JobHandle) {
        let key = JobKey::of(job);
        lock(&self.dependencies).retain(|dep| JobKey::of(dep) != key);
    }

    pub fn clear_dependencies(&self) {
        lock(&self.dependencies).clear();
    }
}

impl<F> Job for FnJob<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn execute(&self) {
        (self.f)()
    }

    fn collect_dependencies(&self, deps: &mut DependencySink<'_>) {
        for dep in lock(&self.dependencies).iter() {
            deps.report(Arc::clone(dep));
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
