#![allow(dead_code)]

use std::collections::BTreeMap;
use jobgraph::config::{GraphFile, JobConfig, RawGraphFile, SchedulerSection};

/// Builder for `GraphFile` to simplify test setup.
pub struct GraphFileBuilder {
    config: RawGraphFile,
}

impl GraphFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawGraphFile {
                scheduler: SchedulerSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.scheduler.threads = Some(threads);
        self
    }

    pub fn with_thread_threshold(mut self, threshold: usize) -> Self {
        self.config.scheduler.thread_threshold = threshold;
        self
    }

    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.config.scheduler.cycles = cycles;
        self
    }

    pub fn build_raw(self) -> RawGraphFile {
        self.config
    }

    pub fn build(self) -> GraphFile {
        GraphFile::try_from(self.config).expect("Failed to build valid graph file from builder")
    }
}

impl Default for GraphFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new() -> Self {
        Self {
            job: JobConfig::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn work_us(mut self, micros: u64) -> Self {
        self.job.work_us = micros;
        self
    }

    pub fn root(mut self, val: bool) -> Self {
        self.job.root = val;
        self
    }

    pub fn panics(mut self, val: bool) -> Self {
        self.job.panic = val;
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

impl Default for JobConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
