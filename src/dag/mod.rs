// src/dag/mod.rs

//! Dependency discovery and scheduling.
//!
//! - [`graph`] builds the per-cycle dependency graph from a root set.
//! - [`scheduler`] owns the root set and drives one cycle over the worker pool.
//! - [`state`] defines the per-cycle job states.
//! - [`report`] defines the result of a cycle.
//! - [`root_set`] holds the explicitly registered jobs.

pub mod graph;
pub mod report;
pub mod root_set;
pub mod scheduler;
pub mod state;

pub use graph::{CycleAnalysis, JobGraph};
pub use report::{ExecutionReport, JobFault};
pub use scheduler::{default_thread_count, Scheduler, SchedulerOptions};
pub use state::JobState;
