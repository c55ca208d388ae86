#![allow(dead_code)]

pub use jobgraph_test_utils::{init_tracing, RecordingLogger};
pub use jobgraph_test_utils::builders;
pub use jobgraph_test_utils::jobs;

/// Threads for the multi-threaded variants of tests (at least two, so rounds
/// really go through the worker pool).
pub fn many_threads() -> usize {
    jobgraph::dag::default_thread_count().max(4)
}
