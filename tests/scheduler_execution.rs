// tests/scheduler_execution.rs

mod common;
use crate::common::jobs::{
    fast_binomial_sum, slow_binomial_sum, CounterJob, SumJob, Value, ValueRef,
};
use crate::common::{init_tracing, many_threads, RecordingLogger};

use std::sync::Arc;

use jobgraph::dag::Scheduler;
use jobgraph::JobHandle;

const BINOMIAL_ROWS: usize = 20;

fn handle<T: jobgraph::Job + 'static>(job: &Arc<T>) -> JobHandle {
    job.clone()
}

#[test]
fn empty_scheduler_executes_nothing() {
    init_tracing();
    let scheduler = Scheduler::new(1);
    let logger = RecordingLogger::new();

    let report = scheduler.execute(&logger);

    assert!(report.is_complete());
    assert_eq!(report.discovered, 0);
    assert_eq!(report.executed, 0);
    assert_eq!(report.rounds, 0);
    assert!(logger.errors().is_empty());
}

fn independent_execution(scheduler: &Scheduler) {
    let logger = RecordingLogger::new();

    let counter_a = CounterJob::new();
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 0);

    scheduler.add(handle(&counter_a));
    assert_eq!(counter_a.get(), 0);
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 1);

    scheduler.remove(&handle(&counter_a));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 1);

    let counter_b = CounterJob::new();
    scheduler.add(handle(&counter_b));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 1);
    assert_eq!(counter_b.get(), 1);

    scheduler.add(handle(&counter_a));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 2);
    assert_eq!(counter_b.get(), 2);

    scheduler.remove(&handle(&counter_a));
    scheduler.remove(&handle(&counter_b));

    // Growing root set: counter `j` has run once per cycle since it was added.
    let mut counters: Vec<Arc<CounterJob>> = Vec::new();
    for _ in 0..256 {
        counters.push(CounterJob::new());
        for (j, counter) in counters.iter().enumerate() {
            assert_eq!(counter.get(), (counters.len() - j - 1) as u64);
        }
        scheduler.add(handle(counters.last().unwrap()));
        let report = scheduler.execute(&logger);
        assert_eq!(report.executed, counters.len());
        assert_eq!(report.rounds, 1);
    }

    assert!(logger.errors().is_empty());
}

#[test]
fn independent_execution_single_threaded() {
    init_tracing();
    independent_execution(&Scheduler::new(1));
}

#[test]
fn independent_execution_multithreaded() {
    init_tracing();
    independent_execution(&Scheduler::new(many_threads()));
}

fn dependent_execution(scheduler: &Scheduler) {
    let logger = RecordingLogger::new();

    let simple_sum = SumJob::new("simple_sum");
    scheduler.add(handle(&simple_sum));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(simple_sum.get(), 0);

    // Dependencies outside the root set are pulled in and executed first.
    let counter_a = CounterJob::new();
    simple_sum.add_input(ValueRef::new(&counter_a));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 1);
    assert_eq!(simple_sum.get(), 1);

    simple_sum.remove_input(&ValueRef::new(&counter_a));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 1);
    assert_eq!(simple_sum.get(), 0);

    let counter_b = CounterJob::new();
    simple_sum.add_input(ValueRef::new(&counter_a));
    simple_sum.add_input(ValueRef::new(&counter_b));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 2);
    assert_eq!(counter_b.get(), 1);
    assert_eq!(simple_sum.get(), 3);

    scheduler.remove(&handle(&simple_sum));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 2);
    assert_eq!(counter_b.get(), 1);
    assert_eq!(simple_sum.get(), 3);

    scheduler.add(handle(&counter_a));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 3);
    assert_eq!(counter_b.get(), 1);

    // A root that is also a dependency still runs once.
    scheduler.add(handle(&simple_sum));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 4);
    assert_eq!(counter_b.get(), 2);
    assert_eq!(simple_sum.get(), 6);

    // Removing a root that is still somebody's dependency keeps it running.
    scheduler.remove(&handle(&counter_a));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 5);
    assert_eq!(counter_b.get(), 3);
    assert_eq!(simple_sum.get(), 8);

    scheduler.remove(&handle(&simple_sum));
    assert!(scheduler.execute(&logger).is_complete());
    assert_eq!(counter_a.get(), 5);
    assert_eq!(counter_b.get(), 3);
    assert_eq!(simple_sum.get(), 8);

    // counter_a listed twice: summed twice, executed once.
    let sum_of_all = SumJob::with_inputs(
        "sum_of_all",
        &[
            ValueRef::new(&counter_a),
            ValueRef::new(&counter_b),
            ValueRef::new(&counter_a),
            ValueRef::new(&simple_sum),
        ],
    );
    scheduler.add(handle(&sum_of_all));
    let report = scheduler.execute(&logger);
    assert!(report.is_complete());
    assert_eq!(report.executed, 4);
    assert_eq!(counter_a.get(), 6);
    assert_eq!(counter_b.get(), 4);
    assert_eq!(simple_sum.get(), 10);
    assert_eq!(sum_of_all.get(), 26);

    assert!(logger.errors().is_empty());
}

#[test]
fn dependent_execution_single_threaded() {
    init_tracing();
    dependent_execution(&Scheduler::new(1));
}

#[test]
fn dependent_execution_multithreaded() {
    init_tracing();
    dependent_execution(&Scheduler::new(many_threads()));
}

#[test]
fn fast_binomial_sum_single_threaded() {
    init_tracing();
    let scheduler = Scheduler::new(1);
    let binomial = fast_binomial_sum(BINOMIAL_ROWS);
    scheduler.add(handle(&binomial));

    let report = scheduler.execute(&RecordingLogger::new());

    assert!(report.is_complete());
    assert_eq!(binomial.get(), 1u64 << BINOMIAL_ROWS);
}

#[test]
fn fast_binomial_sum_multithreaded() {
    init_tracing();
    let scheduler = Scheduler::new(many_threads());
    let binomial = fast_binomial_sum(BINOMIAL_ROWS);
    scheduler.add(handle(&binomial));

    let report = scheduler.execute(&RecordingLogger::new());

    assert!(report.is_complete());
    assert_eq!(binomial.get(), 1u64 << BINOMIAL_ROWS);
}

#[test]
fn slow_binomial_sum_single_and_multithreaded_agree() {
    init_tracing();
    let rows = BINOMIAL_ROWS as u64;

    for threads in [1, many_threads()] {
        let scheduler = Scheduler::new(threads);
        let binomial = slow_binomial_sum(rows);
        scheduler.add(handle(&binomial));

        let report = scheduler.execute(&RecordingLogger::new());

        assert!(report.is_complete());
        assert_eq!(report.rounds, 2);
        assert_eq!(binomial.get(), 1u64 << rows);
    }
}

#[test]
fn jobs_shared_between_schedulers_run_once_per_scheduler_cycle() {
    init_tracing();
    let first = Scheduler::new(2);
    let second = Scheduler::new(2);
    let counter = CounterJob::new();

    first.add(handle(&counter));
    second.add(handle(&counter));

    first.execute(&RecordingLogger::new());
    second.execute(&RecordingLogger::new());

    assert_eq!(counter.get(), 2);
}
