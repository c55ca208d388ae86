// src/runner.rs

//! Synthetic jobs built from a [`GraphFile`], and the cycle loop that runs
//! them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::model::{GraphFile, JobConfig};
use crate::dag::{ExecutionReport, Scheduler};
use crate::errors::{JobGraphError, Result};
use crate::job::{FnJob, JobHandle};
use crate::logging::Logger;

/// Closure-backed job whose body is chosen at runtime.
pub type BoxedFnJob = FnJob<Box<dyn Fn() + Send + Sync>>;

/// One job per `[job.<name>]` section, wired to its `after` list.
pub struct GraphJobs {
    jobs: BTreeMap<String, Arc<BoxedFnJob>>,
    executions: BTreeMap<String, Arc<AtomicU64>>,
}

impl GraphJobs {
    /// Build and wire the jobs described by `cfg`.
    ///
    /// Cyclic `after` lists are wired as given; the scheduler reports them.
    pub fn build(cfg: &GraphFile) -> Result<Self> {
        let mut jobs = BTreeMap::new();
        let mut executions = BTreeMap::new();

        for (name, job_cfg) in cfg.job.iter() {
            let counter = Arc::new(AtomicU64::new(0));
            let job = Arc::new(FnJob::new(name.clone(), job_body(name, job_cfg, &counter)));
            jobs.insert(name.clone(), job);
            executions.insert(name.clone(), counter);
        }

        for (name, job_cfg) in cfg.job.iter() {
            let job = jobs
                .get(name)
                .ok_or_else(|| JobGraphError::UnknownJob(name.clone()))?;
            for dep in job_cfg.after.iter() {
                let dep_job = jobs
                    .get(dep)
                    .ok_or_else(|| JobGraphError::UnknownJob(dep.clone()))?;
                let handle: JobHandle = dep_job.clone();
                job.depend_on(handle);
            }
        }

        debug!(jobs = jobs.len(), "built jobs from graph file");
        Ok(Self { jobs, executions })
    }

    /// Handle of the job called `name`.
    pub fn handle(&self, name: &str) -> Option<JobHandle> {
        self.jobs.get(name).map(|job| {
            let handle: JobHandle = job.clone();
            handle
        })
    }

    /// How many times the job called `name` has executed.
    pub fn executions(&self, name: &str) -> Option<u64> {
        self.executions
            .get(name)
            .map(|counter| counter.load(Ordering::Acquire))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(|s| s.as_str())
    }
}

impl Drop for GraphJobs {
    fn drop(&mut self) {
        // Dependency lists hold strong handles; cyclic graphs would leak.
        for job in self.jobs.values() {
            job.clear_dependencies();
        }
    }
}

fn job_body(name: &str, cfg: &JobConfig, counter: &Arc<AtomicU64>) -> Box<dyn Fn() + Send + Sync> {
    let name = name.to_string();
    let work = Duration::from_micros(cfg.work_us);
    let panics = cfg.panic;
    let counter = Arc::clone(counter);

    Box::new(move || {
        counter.fetch_add(1, Ordering::AcqRel);
        if !work.is_zero() {
            let deadline = Instant::now() + work;
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
        }
        if panics {
            panic!("job '{name}' is configured to panic");
        }
    })
}

/// Add every root job of `cfg` to `scheduler`.
pub fn register_roots(cfg: &GraphFile, jobs: &GraphJobs, scheduler: &Scheduler) -> Result<()> {
    for name in cfg.root_jobs() {
        let handle = jobs
            .handle(name)
            .ok_or_else(|| JobGraphError::UnknownJob(name.to_string()))?;
        scheduler.add(handle);
    }
    Ok(())
}

/// Execute `cycles` scheduler cycles and collect their reports.
pub fn run_cycles(scheduler: &Scheduler, cycles: usize, logger: &dyn Logger) -> Vec<ExecutionReport> {
    let mut reports = Vec::with_capacity(cycles);

    for cycle in 0..cycles {
        let started = Instant::now();
        let report = scheduler.execute(logger);
        debug!(
            cycle,
            discovered = report.discovered,
            executed = report.executed,
            rounds = report.rounds,
            faults = report.faults.len(),
            skipped = report.skipped(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "cycle complete"
        );
        logger.info(&format!("cycle {cycle}: {}", report.summary()));
        reports.push(report);
    }

    reports
}
