// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Job graph description as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// threads = 4
/// thread_threshold = 1
/// cycles = 3
///
/// [job.scene]
/// work_us = 100
///
/// [job.render]
/// after = ["scene"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGraphFile {
    /// Scheduler tuning from `[scheduler]`.
    #[serde(default)]
    pub scheduler: SchedulerSection,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// Validated job graph description.
///
/// Only obtainable through `TryFrom<RawGraphFile>` (see `config::validate`),
/// so holders can rely on every `after` entry naming a known job.
#[derive(Debug, Clone)]
pub struct GraphFile {
    pub scheduler: SchedulerSection,
    pub job: BTreeMap<String, JobConfig>,
}

impl GraphFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        job: BTreeMap<String, JobConfig>,
    ) -> Self {
        Self { scheduler, job }
    }

    /// Names of jobs that go into the root set.
    pub fn root_jobs(&self) -> impl Iterator<Item = &str> {
        self.job
            .iter()
            .filter(|(_, job)| job.root)
            .map(|(name, _)| name.as_str())
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Maximum worker threads per round. `None` uses the available
    /// parallelism of the machine.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Minimum number of ready jobs per worker thread.
    #[serde(default = "default_thread_threshold")]
    pub thread_threshold: usize,

    /// Cycles the runner executes when `--cycles` is not given.
    #[serde(default = "default_cycles")]
    pub cycles: usize,
}

fn default_thread_threshold() -> usize {
    1
}

fn default_cycles() -> usize {
    1
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            threads: None,
            thread_threshold: default_thread_threshold(),
            cycles: default_cycles(),
        }
    }
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Jobs this one depends on every cycle.
    #[serde(default)]
    pub after: Vec<String>,

    /// Simulated busy time per execution, in microseconds.
    #[serde(default)]
    pub work_us: u64,

    /// Whether the job is added to the root set. Jobs with `root = false`
    /// only run when another job depends on them.
    #[serde(default = "default_root")]
    pub root: bool,

    /// Make `execute` panic, to exercise fault isolation.
    #[serde(default)]
    pub panic: bool,
}

fn default_root() -> bool {
    true
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            after: Vec::new(),
            work_us: 0,
            root: default_root(),
            panic: false,
        }
    }
}
