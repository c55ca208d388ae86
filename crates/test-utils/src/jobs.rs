//! Small jobs used across the integration tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use jobgraph::{DependencySink, Job, JobHandle};

/// A job that exposes a number after it has executed.
pub trait Value: Job {
    fn get(&self) -> u64;
}

/// A value job seen both as a schedulable handle and as a value.
#[derive(Clone)]
pub struct ValueRef {
    job: JobHandle,
    value: Arc<dyn Value>,
}

impl ValueRef {
    pub fn new<T: Value + 'static>(value: &Arc<T>) -> Self {
        let job: JobHandle = value.clone();
        let value: Arc<dyn Value> = value.clone();
        Self { job, value }
    }

    pub fn job(&self) -> &JobHandle {
        &self.job
    }

    pub fn get(&self) -> u64 {
        self.value.get()
    }
}

/// Counts its executions.
#[derive(Default)]
pub struct CounterJob {
    count: AtomicU64,
}

impl CounterJob {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Job for CounterJob {
    fn execute(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }
}

impl Value for CounterJob {
    fn get(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Holds a fixed number.
pub struct ConstJob {
    value: u64,
}

impl ConstJob {
    pub fn new(value: u64) -> Arc<Self> {
        Arc::new(Self { value })
    }
}

impl Job for ConstJob {
    fn execute(&self) {}
}

impl Value for ConstJob {
    fn get(&self) -> u64 {
        self.value
    }
}

/// Sums the values of its inputs, each of which it depends on.
///
/// An input listed twice is counted twice but still only a single
/// dependency.
#[derive(Default)]
pub struct SumJob {
    name: String,
    value: AtomicU64,
    inputs: Mutex<Vec<ValueRef>>,
}

impl SumJob {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ..Self::default()
        })
    }

    pub fn with_inputs(name: &str, inputs: &[ValueRef]) -> Arc<Self> {
        let sum = Self::new(name);
        for input in inputs {
            sum.add_input(input.clone());
        }
        sum
    }

    pub fn add_input(&self, input: ValueRef) {
        self.inputs.lock().unwrap().push(input);
    }

    /// Remove one occurrence of `input`.
    pub fn remove_input(&self, input: &ValueRef) {
        let mut inputs = self.inputs.lock().unwrap();
        if let Some(pos) = inputs
            .iter()
            .position(|i| Arc::ptr_eq(i.job(), input.job()))
        {
            inputs.swap_remove(pos);
        }
    }
}

impl Job for SumJob {
    fn execute(&self) {
        let total = self.inputs.lock().unwrap().iter().map(ValueRef::get).sum();
        self.value.store(total, Ordering::Release);
    }

    fn collect_dependencies(&self, deps: &mut DependencySink<'_>) {
        for input in self.inputs.lock().unwrap().iter() {
            deps.report(input.job().clone());
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Value for SumJob {
    fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

/// Computes a binomial coefficient the slow, recursive way.
pub struct SlowBinomialJob {
    row: u64,
    column: u64,
    value: AtomicU64,
}

impl SlowBinomialJob {
    pub fn new(row: u64, column: u64) -> Arc<Self> {
        Arc::new(Self {
            row,
            column,
            value: AtomicU64::new(0),
        })
    }

    fn binomial(row: u64, column: u64) -> u64 {
        if row == 0 || column == 0 || column >= row {
            1
        } else {
            Self::binomial(row - 1, column - 1) + Self::binomial(row - 1, column)
        }
    }
}

impl Job for SlowBinomialJob {
    fn execute(&self) {
        self.value
            .store(Self::binomial(self.row, self.column), Ordering::Release);
    }
}

impl Value for SlowBinomialJob {
    fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

/// Sum over row `rows` of Pascal's triangle, built as one job per cell.
///
/// Every inner cell depends on the two cells above it, which gives a deep
/// and wide graph. The result is `2^rows`.
pub fn fast_binomial_sum(rows: usize) -> Arc<SumJob> {
    let mut previous: Vec<ValueRef> = Vec::new();
    let mut current: Vec<ValueRef> = Vec::new();

    for row in 0..=rows {
        std::mem::swap(&mut previous, &mut current);
        current.clear();
        for i in 0..=row {
            let cell = if i == 0 || i >= row {
                ValueRef::new(&ConstJob::new(1))
            } else {
                ValueRef::new(&SumJob::with_inputs(
                    &format!("cell_{row}_{i}"),
                    &[previous[i - 1].clone(), previous[i].clone()],
                ))
            };
            current.push(cell);
        }
    }

    SumJob::with_inputs("binomial_sum", &current)
}

/// Sum over row `rows` of Pascal's triangle, one independent slow job per cell.
pub fn slow_binomial_sum(rows: u64) -> Arc<SumJob> {
    let sum = SumJob::new("slow_binomial_sum");
    for column in 0..=rows {
        sum.add_input(ValueRef::new(&SlowBinomialJob::new(rows, column)));
    }
    sum
}

/// What a [`ProbeJob`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// Shared, ordered record of probe events across threads.
#[derive(Default)]
pub struct Timeline {
    events: Mutex<Vec<Event>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl Timeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Position of `event`, if it happened.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == event)
    }

    /// Number of `Started` events for `name`.
    pub fn starts_of(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Event::Started(n) if n == name))
            .count()
    }

    /// Highest number of probes observed executing at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::Acquire)
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Records start/finish into a [`Timeline`] and reports an editable
/// dependency list (duplicates allowed).
pub struct ProbeJob {
    name: String,
    timeline: Arc<Timeline>,
    dependencies: Mutex<Vec<JobHandle>>,
    panics: bool,
}

impl ProbeJob {
    pub fn new(name: &str, timeline: &Arc<Timeline>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            timeline: Arc::clone(timeline),
            dependencies: Mutex::new(Vec::new()),
            panics: false,
        })
    }

    /// A probe that records its start and then panics.
    pub fn panicking(name: &str, timeline: &Arc<Timeline>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            timeline: Arc::clone(timeline),
            dependencies: Mutex::new(Vec::new()),
            panics: true,
        })
    }

    pub fn depend_on(&self, job: JobHandle) {
        self.dependencies.lock().unwrap().push(job);
    }

    pub fn clear_dependencies(&self) {
        self.dependencies.lock().unwrap().clear();
    }
}

impl Job for ProbeJob {
    fn execute(&self) {
        let active = self.timeline.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.timeline.max_active.fetch_max(active, Ordering::AcqRel);
        self.timeline.push(Event::Started(self.name.clone()));

        if self.panics {
            self.timeline.active.fetch_sub(1, Ordering::AcqRel);
            panic!("probe '{}' failed on purpose", self.name);
        }

        std::thread::sleep(std::time::Duration::from_millis(2));

        self.timeline.push(Event::Finished(self.name.clone()));
        self.timeline.active.fetch_sub(1, Ordering::AcqRel);
    }

    fn collect_dependencies(&self, deps: &mut DependencySink<'_>) {
        for dep in self.dependencies.lock().unwrap().iter() {
            deps.report(dep.clone());
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
