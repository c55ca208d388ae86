// src/job/shared.rs

//! Wrappers for jobs that are shared between schedulers.
//!
//! A scheduler guarantees a job runs at most once per *its own* cycle. When
//! the same job is registered with several schedulers whose cycles overlap,
//! the job itself has to cope with concurrent `execute` calls. These
//! wrappers make that explicit instead of relying on the callers never
//! overlapping:
//!
//! - [`Exclusive`] serializes `execute` behind a private lock.
//! - [`DirtyJob`] only runs its inner job when it has been marked dirty,
//!   which doubles as "compute once, however many schedulers ask". Callers
//!   that arrive while the work is in progress wait for it to finish.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::job::{DependencySink, Job};
use crate::pool::round::lock;

/// Runs the inner job's `execute` under a private mutex.
pub struct Exclusive<J: Job> {
    inner: J,
    gate: Mutex<()>,
}

impl<J: Job> Exclusive<J> {
    pub fn new(inner: J) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }

    pub fn inner(&self) -> &J {
        &self.inner
    }
}

impl<J: Job> Job for Exclusive<J> {
    fn execute(&self) {
        let _guard = lock(&self.gate);
        self.inner.execute();
    }

    fn collect_dependencies(&self, deps: &mut DependencySink<'_>) {
        self.inner.collect_dependencies(deps);
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Runs the inner job only when it was marked dirty since its last run.
///
/// Starts dirty so the first cycle always computes. Dependencies are still
/// reported every cycle, so ordering is preserved even when the work is
/// skipped. The check and the computation happen under a private lock: a
/// concurrent `execute` returns only once the result is in place.
pub struct DirtyJob<J: Job> {
    inner: J,
    dirty: AtomicBool,
    gate: Mutex<()>,
}

impl<J: Job> DirtyJob<J> {
    pub fn new(inner: J) -> Self {
        Self {
            inner,
            dirty: AtomicBool::new(true),
            gate: Mutex::new(()),
        }
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn inner(&self) -> &J {
        &self.inner
    }
}

impl<J: Job> Job for DirtyJob<J> {
    fn execute(&self) {
        let _guard = lock(&self.gate);
        // Marks that arrive during `inner.execute` survive for the next call.
        if self.dirty.swap(false, Ordering::AcqRel) {
            self.inner.execute();
        } else {
            trace!(job = %self.inner.name(), "clean; skipping execute");
        }
    }

    fn collect_dependencies(&self, deps: &mut DependencySink<'_>) {
        self.inner.collect_dependencies(deps);
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
