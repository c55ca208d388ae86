// src/dag/state.rs

//! Per-cycle state of a job in the dependency graph.

/// Where a job is in the current cycle.
///
/// Jobs move forward only:
/// `Undiscovered -> Discovered -> DependenciesCollected -> Ready -> Running -> Done`.
/// A job that can never become `Ready` (it sits on a dependency cycle, or
/// depends on one) ends the cycle in `Cycle` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not reachable from the root set this cycle.
    Undiscovered,
    /// Reached, but its dependencies have not been collected yet.
    Discovered,
    /// Dependencies collected; waiting on at least one of them.
    DependenciesCollected,
    /// Every dependency is done; will run in the next round.
    Ready,
    /// Dispatched in the current round.
    Running,
    /// Executed this cycle.
    Done,
    /// Skipped this cycle because of a dependency cycle.
    Cycle,
}

impl JobState {
    /// `Done` and `Cycle` end a job's cycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Cycle)
    }
}
