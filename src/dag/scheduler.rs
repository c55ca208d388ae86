// src/dag/scheduler.rs

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::model::SchedulerSection;
use crate::dag::graph::JobGraph;
use crate::dag::report::{ExecutionReport, JobFault};
use crate::dag::root_set::RootSet;
use crate::job::JobHandle;
use crate::logging::Logger;
use crate::pool::round::{lock, panic_message};
use crate::pool::{ThreadInfo, WorkerPool};

/// Number of threads to use when none is configured.
pub fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Tuning knobs for a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Upper bound on worker threads used per round (clamped to >= 1).
    pub max_threads: usize,
    /// Minimum number of ready jobs per worker thread (clamped to >= 1).
    ///
    /// A round with `n` ready jobs uses
    /// `min(max_threads, ceil(n / thread_threshold))` threads.
    pub thread_threshold: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_threads: default_thread_count(),
            thread_threshold: 1,
        }
    }
}

/// Jobs of one round plus the shared cursor workers pull from.
struct Batch {
    jobs: Vec<JobHandle>,
    cursor: AtomicUsize,
    faults: Mutex<Vec<JobFault>>,
}

fn drain_batch(_info: ThreadInfo, batch: &Batch) {
    loop {
        let index = batch.cursor.fetch_add(1, Ordering::Relaxed);
        let Some(job) = batch.jobs.get(index) else {
            break;
        };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| job.execute())) {
            lock(&batch.faults).push(JobFault {
                job: job.name().to_string(),
                message: panic_message(payload.as_ref()),
            });
        }
    }
}

/// Dynamic dependency-graph job scheduler.
///
/// The scheduler owns a root set of jobs and, on every [`Scheduler::execute`],
/// rebuilds the dependency graph from it and runs every reachable job once:
///
/// - discovery: every job reports its dependencies; unknown ones are pulled in
/// - readiness: jobs with no unmet dependencies form the first round
/// - execution: each round runs on the worker pool; finishing a job releases
///   its dependents into the next round
/// - cycles: whatever never became ready is skipped and reported once
///
/// The root set may be edited from any thread at any time; edits apply from
/// the next `execute`. Concurrent `execute` calls on one scheduler are
/// serialized.
pub struct Scheduler {
    roots: Mutex<RootSet>,
    pool: WorkerPool,
    max_threads: AtomicUsize,
    thread_threshold: AtomicUsize,
    /// Held for the whole of `execute`.
    execution: Mutex<()>,
}

impl Scheduler {
    /// Scheduler that uses at most `max_threads` threads per round.
    ///
    /// `1` runs every job on the calling thread.
    pub fn new(max_threads: usize) -> Self {
        Self::with_options(SchedulerOptions {
            max_threads,
            thread_threshold: 1,
        })
    }

    pub fn with_options(options: SchedulerOptions) -> Self {
        Self {
            roots: Mutex::new(RootSet::default()),
            pool: WorkerPool::new(),
            max_threads: AtomicUsize::new(options.max_threads.max(1)),
            thread_threshold: AtomicUsize::new(options.thread_threshold.max(1)),
            execution: Mutex::new(()),
        }
    }

    /// Construct a scheduler from the `[scheduler]` config section.
    pub fn from_config(section: &SchedulerSection) -> Self {
        Self::with_options(SchedulerOptions {
            max_threads: section.threads.unwrap_or_else(default_thread_count),
            thread_threshold: section.thread_threshold,
        })
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads.load(Ordering::Relaxed)
    }

    pub fn set_max_threads(&self, max_threads: usize) {
        self.max_threads.store(max_threads.max(1), Ordering::Relaxed);
    }

    pub fn thread_threshold(&self) -> usize {
        self.thread_threshold.load(Ordering::Relaxed)
    }

    pub fn set_thread_threshold(&self, threshold: usize) {
        self.thread_threshold.store(threshold.max(1), Ordering::Relaxed);
    }

    /// Register `job` as a root. Adding a job twice has no further effect.
    pub fn add(&self, job: JobHandle) {
        let name = job.name().to_string();
        if lock(&self.roots).insert(job) {
            debug!(job = %name, "added job to root set");
        }
    }

    /// Unregister `job`. It may still run as another job's dependency.
    pub fn remove(&self, job: &JobHandle) {
        if lock(&self.roots).remove(job) {
            debug!(job = %job.name(), "removed job from root set");
        }
    }

    pub fn contains(&self, job: &JobHandle) -> bool {
        lock(&self.roots).contains(job)
    }

    /// Number of jobs in the root set.
    pub fn len(&self) -> usize {
        lock(&self.roots).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.roots).is_empty()
    }

    /// Run one cycle. See [`Scheduler::execute_with`].
    pub fn execute(&self, logger: &dyn Logger) -> ExecutionReport {
        self.execute_with(logger, || {})
    }

    /// Run one cycle, calling `on_round_complete` on this thread after every
    /// pool round.
    ///
    /// Cycle errors, job panics and pool failures are reported through
    /// `logger`; none of them abort the cycle.
    pub fn execute_with(
        &self,
        logger: &dyn Logger,
        mut on_round_complete: impl FnMut(),
    ) -> ExecutionReport {
        let _execution = lock(&self.execution);

        let snapshot = lock(&self.roots).snapshot();
        let mut graph = JobGraph::discover(&snapshot);

        let mut report = ExecutionReport {
            discovered: graph.len(),
            ..ExecutionReport::default()
        };

        for fault in graph.take_faults() {
            logger.error(&format!(
                "job '{}' panicked while collecting dependencies: {}",
                fault.job, fault.message
            ));
            report.faults.push(fault);
        }

        let mut ready = graph.initially_ready();
        while !ready.is_empty() {
            graph.mark_running(&ready);

            let faults = self.run_round(&graph, &ready, logger);
            report.rounds += 1;
            report.executed += ready.len();
            on_round_complete();

            for fault in faults {
                logger.error(&format!(
                    "job '{}' panicked during execute: {}",
                    fault.job, fault.message
                ));
                report.faults.push(fault);
            }

            ready = graph.complete(&ready);
        }

        let stuck = graph.mark_unfinished();
        if !stuck.is_empty() {
            let analysis = graph.analyse_cycles(&stuck);
            let names = |ids: &[usize]| -> Vec<String> {
                ids.iter()
                    .map(|&id| graph.job(id).name().to_string())
                    .collect()
            };
            report.cyclic = names(&analysis.cyclic);
            report.blocked = names(&analysis.blocked);

            logger.error(&format!(
                "job graph has circular dependencies; skipped {} job(s) this cycle: cyclic [{}], blocked [{}]",
                stuck.len(),
                report.cyclic.join(", "),
                report.blocked.join(", ")
            ));
        }

        debug!(
            discovered = report.discovered,
            executed = report.executed,
            rounds = report.rounds,
            skipped = report.skipped(),
            "scheduler cycle finished"
        );

        report
    }

    /// Execute the jobs in `ids` as one round and return the caught faults.
    fn run_round(&self, graph: &JobGraph, ids: &[usize], logger: &dyn Logger) -> Vec<JobFault> {
        let batch = Arc::new(Batch {
            jobs: ids.iter().map(|&id| Arc::clone(graph.job(id))).collect(),
            cursor: AtomicUsize::new(0),
            faults: Mutex::new(Vec::new()),
        });

        let threshold = self.thread_threshold();
        let threads = batch
            .jobs
            .len()
            .div_ceil(threshold)
            .min(self.max_threads())
            .max(1);

        debug!(jobs = batch.jobs.len(), threads, "dispatching round");

        if threads > 1 {
            if let Err(e) = self.pool.run(threads, Arc::clone(&batch), drain_batch) {
                logger.warn(&format!("worker pool unavailable ({e}); running round inline"));
            }
        }

        // Inline path, and the remainder of a round the pool could not take.
        drain_batch(
            ThreadInfo {
                thread_id: 0,
                thread_count: 1,
            },
            &batch,
        );

        std::mem::take(&mut *lock(&batch.faults))
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        debug!(
            live_threads = self.pool.live_threads(),
            "shutting down scheduler worker pool"
        );
    }
}
