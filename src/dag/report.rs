// src/dag/report.rs

//! Result types for one scheduler cycle.

/// A panic caught while calling into a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFault {
    /// [`Job::name`](crate::job::Job::name) of the faulting job.
    pub job: String,
    /// Text of the panic payload.
    pub message: String,
}

/// Summary of a single [`Scheduler::execute`](crate::dag::Scheduler::execute) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Jobs reachable from the root set this cycle.
    pub discovered: usize,
    /// Jobs whose `execute` was invoked (faulted ones included).
    pub executed: usize,
    /// Pool rounds dispatched.
    pub rounds: usize,
    /// Panics caught in `collect_dependencies` or `execute`.
    pub faults: Vec<JobFault>,
    /// Jobs skipped because they sit on a dependency cycle.
    pub cyclic: Vec<String>,
    /// Jobs skipped because they (transitively) depend on a cycle.
    pub blocked: Vec<String>,
}

impl ExecutionReport {
    /// `true` when every discovered job executed (no cycle was found).
    pub fn is_complete(&self) -> bool {
        self.cyclic.is_empty() && self.blocked.is_empty()
    }

    /// Number of jobs skipped because of cycles.
    pub fn skipped(&self) -> usize {
        self.cyclic.len() + self.blocked.len()
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "executed {}/{} jobs in {} rounds ({} faults, {} skipped)",
            self.executed,
            self.discovered,
            self.rounds,
            self.faults.len(),
            self.skipped()
        )
    }
}
