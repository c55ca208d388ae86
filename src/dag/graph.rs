// src/dag/graph.rs

//! Per-cycle dependency graph.
//!
//! A [`JobGraph`] is built from scratch at the start of every cycle by
//! walking the root set and asking each job for its dependencies. Nothing in
//! here survives the cycle; jobs are free to report a different set next
//! time.

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace};

use crate::dag::report::JobFault;
use crate::dag::state::JobState;
use crate::job::{DependencySink, JobHandle, JobKey};
use crate::pool::round::panic_message;

/// Internal node: the job plus its edges and unmet-dependency count.
struct JobNode {
    job: JobHandle,
    /// Jobs this one waits for (deduplicated).
    dependencies: Vec<usize>,
    /// Jobs waiting for this one.
    dependents: Vec<usize>,
    /// Dependencies that have not completed yet in this cycle.
    unmet: usize,
    state: JobState,
}

/// Jobs stuck behind cycles after a cycle has run as far as it can.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleAnalysis {
    /// Jobs on a dependency cycle (including self-dependencies).
    pub cyclic: Vec<usize>,
    /// Jobs that are not on a cycle themselves but depend on one.
    pub blocked: Vec<usize>,
}

/// Dependency graph discovered from a root-set snapshot.
pub struct JobGraph {
    nodes: Vec<JobNode>,
    index: HashMap<JobKey, usize>,
    faults: Vec<JobFault>,
}

impl JobGraph {
    /// Discover every job reachable from `roots`.
    ///
    /// Each job's `collect_dependencies` is called exactly once. Repeated
    /// roots and repeated reports of the same dependency collapse into a
    /// single node / edge. A panic while collecting is recorded as a fault
    /// and the job keeps whatever it reported before panicking.
    pub fn discover(roots: &[JobHandle]) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            faults: Vec::new(),
        };

        let mut worklist: VecDeque<usize> = VecDeque::new();
        for root in roots {
            let (id, inserted) = graph.insert(root);
            if inserted {
                worklist.push_back(id);
            }
        }

        let mut seen: HashSet<JobKey> = HashSet::new();
        let mut reported: Vec<JobHandle> = Vec::new();

        while let Some(id) = worklist.pop_front() {
            seen.clear();
            reported.clear();

            let job = Arc::clone(&graph.nodes[id].job);
            let collected = catch_unwind(AssertUnwindSafe(|| {
                let mut sink = DependencySink::new(&mut seen, &mut reported);
                job.collect_dependencies(&mut sink);
            }));
            if let Err(payload) = collected {
                graph.faults.push(JobFault {
                    job: job.name().to_string(),
                    message: panic_message(payload.as_ref()),
                });
            }

            for dep in reported.drain(..) {
                let (dep_id, inserted) = graph.insert(&dep);
                if inserted {
                    worklist.push_back(dep_id);
                }
                graph.nodes[id].dependencies.push(dep_id);
                graph.nodes[dep_id].dependents.push(id);
            }

            let node = &mut graph.nodes[id];
            node.unmet = node.dependencies.len();
            node.state = JobState::DependenciesCollected;
            trace!(
                job = %node.job.name(),
                dependencies = node.unmet,
                "collected dependencies"
            );
        }

        debug!(jobs = graph.nodes.len(), roots = roots.len(), "job graph discovered");
        graph
    }

    fn insert(&mut self, job: &JobHandle) -> (usize, bool) {
        let key = JobKey::of(job);
        if let Some(&id) = self.index.get(&key) {
            return (id, false);
        }

        let id = self.nodes.len();
        self.nodes.push(JobNode {
            job: Arc::clone(job),
            dependencies: Vec::new(),
            dependents: Vec::new(),
            unmet: 0,
            state: JobState::Discovered,
        });
        self.index.insert(key, id);
        (id, true)
    }

    /// Number of discovered jobs.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn job(&self, id: usize) -> &JobHandle {
        &self.nodes[id].job
    }

    /// Node id of `job`, if it was discovered.
    pub fn id_of(&self, job: &JobHandle) -> Option<usize> {
        self.index.get(&JobKey::of(job)).copied()
    }

    /// State of `job` in this cycle; `Undiscovered` if it is not part of it.
    pub fn state_of(&self, job: &JobHandle) -> JobState {
        self.id_of(job)
            .map(|id| self.nodes[id].state)
            .unwrap_or(JobState::Undiscovered)
    }

    /// Distinct dependencies of node `id`.
    pub fn dependencies_of(&self, id: usize) -> &[usize] {
        &self.nodes[id].dependencies
    }

    /// Nodes that depend on node `id`.
    pub fn dependents_of(&self, id: usize) -> &[usize] {
        &self.nodes[id].dependents
    }

    /// Panics caught during discovery.
    pub fn take_faults(&mut self) -> Vec<JobFault> {
        std::mem::take(&mut self.faults)
    }

    /// Mark every job without unmet dependencies `Ready` and return them.
    pub fn initially_ready(&mut self) -> Vec<usize> {
        let mut ready = Vec::new();
        for (id, node) in self.nodes.iter_mut().enumerate() {
            if node.state == JobState::DependenciesCollected && node.unmet == 0 {
                node.state = JobState::Ready;
                ready.push(id);
            }
        }
        ready
    }

    pub fn mark_running(&mut self, batch: &[usize]) {
        for &id in batch {
            self.nodes[id].state = JobState::Running;
        }
    }

    /// Mark a finished round `Done` and return the jobs it unblocked.
    pub fn complete(&mut self, batch: &[usize]) -> Vec<usize> {
        let mut ready = Vec::new();

        for &id in batch {
            self.nodes[id].state = JobState::Done;

            for i in 0..self.dependents_of(id).len() {
                let dependent = self.dependents_of(id)[i];
                let node = &mut self.nodes[dependent];
                node.unmet = node.unmet.saturating_sub(1);
                if node.unmet == 0 && node.state == JobState::DependenciesCollected {
                    node.state = JobState::Ready;
                    ready.push(dependent);
                }
            }
        }

        ready
    }

    /// Jobs that did not reach `Done`, marked `Cycle`.
    pub fn mark_unfinished(&mut self) -> Vec<usize> {
        let mut stuck = Vec::new();
        for (id, node) in self.nodes.iter_mut().enumerate() {
            if !node.state.is_terminal() {
                node.state = JobState::Cycle;
                stuck.push(id);
            }
        }
        stuck
    }

    /// Split stuck jobs into those on a cycle and those merely behind one.
    ///
    /// Runs Tarjan's SCC over the subgraph of `stuck` jobs: a component with
    /// more than one job, or a job depending on itself, is a cycle.
    pub fn analyse_cycles(&self, stuck: &[usize]) -> CycleAnalysis {
        let mut subgraph: DiGraph<usize, ()> = DiGraph::new();
        let mut local: HashMap<usize, NodeIndex> = HashMap::new();

        for &id in stuck {
            local.insert(id, subgraph.add_node(id));
        }
        for &id in stuck {
            for dep in self.dependencies_of(id) {
                if let Some(&to) = local.get(dep) {
                    subgraph.add_edge(local[&id], to, ());
                }
            }
        }

        let mut analysis = CycleAnalysis::default();
        for component in tarjan_scc(&subgraph) {
            let on_cycle = component.len() > 1 || {
                let id = subgraph[component[0]];
                self.dependencies_of(id).contains(&id)
            };
            let target = if on_cycle {
                &mut analysis.cyclic
            } else {
                &mut analysis.blocked
            };
            target.extend(component.iter().map(|&n| subgraph[n]));
        }

        analysis.cyclic.sort_unstable();
        analysis.blocked.sort_unstable();
        analysis
    }
}
