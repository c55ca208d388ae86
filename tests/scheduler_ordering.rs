// tests/scheduler_ordering.rs

mod common;
use crate::common::jobs::{CounterJob, Event, ProbeJob, Timeline, Value};
use crate::common::{init_tracing, many_threads, RecordingLogger};

use std::sync::Arc;

use jobgraph::dag::{JobGraph, Scheduler, SchedulerOptions};
use jobgraph::{JobHandle, JobState};

fn handle<T: jobgraph::Job + 'static>(job: &Arc<T>) -> JobHandle {
    job.clone()
}

fn started(name: &str) -> Event {
    Event::Started(name.to_string())
}

fn finished(name: &str) -> Event {
    Event::Finished(name.to_string())
}

/// R -> {A, B}, A -> {C}, B -> {C}
fn diamond(timeline: &Arc<Timeline>) -> [Arc<ProbeJob>; 4] {
    let r = ProbeJob::new("R", timeline);
    let a = ProbeJob::new("A", timeline);
    let b = ProbeJob::new("B", timeline);
    let c = ProbeJob::new("C", timeline);
    r.depend_on(handle(&a));
    r.depend_on(handle(&b));
    a.depend_on(handle(&c));
    b.depend_on(handle(&c));
    [r, a, b, c]
}

#[test]
fn diamond_runs_dependencies_first_and_siblings_in_one_round() {
    init_tracing();
    let timeline = Timeline::new();
    let [r, ..] = diamond(&timeline);

    let scheduler = Scheduler::new(many_threads());
    scheduler.add(handle(&r));

    let mut rounds = 0;
    let report = scheduler.execute_with(&RecordingLogger::new(), || rounds += 1);

    assert!(report.is_complete());
    assert_eq!(report.discovered, 4);
    assert_eq!(report.executed, 4);
    assert_eq!(report.rounds, 3);
    assert_eq!(rounds, 3);

    for name in ["R", "A", "B", "C"] {
        assert_eq!(timeline.starts_of(name), 1, "{name} should run exactly once");
    }

    let pos = |e: Event| timeline.position(&e).unwrap();
    assert!(pos(finished("C")) < pos(started("A")));
    assert!(pos(finished("C")) < pos(started("B")));
    assert!(pos(finished("A")) < pos(started("R")));
    assert!(pos(finished("B")) < pos(started("R")));
    assert_eq!(timeline.events().len(), 8);
}

#[test]
fn diamond_on_a_single_thread_keeps_the_same_order() {
    init_tracing();
    let timeline = Timeline::new();
    let [r, ..] = diamond(&timeline);

    let scheduler = Scheduler::new(1);
    scheduler.add(handle(&r));
    let report = scheduler.execute(&RecordingLogger::new());

    assert_eq!(report.executed, 4);
    assert_eq!(timeline.max_concurrency(), 1);
    let events = timeline.events();
    assert_eq!(events.first(), Some(&started("C")));
    assert_eq!(events.last(), Some(&finished("R")));
}

#[test]
fn duplicate_dependency_reports_are_idempotent() {
    init_tracing();
    let timeline = Timeline::new();
    let parent = ProbeJob::new("parent", &timeline);
    let child = ProbeJob::new("child", &timeline);
    for _ in 0..5 {
        parent.depend_on(handle(&child));
    }

    let graph = JobGraph::discover(&[handle(&parent), handle(&parent)]);
    assert_eq!(graph.len(), 2);
    let parent_id = graph.id_of(&handle(&parent)).unwrap();
    let child_id = graph.id_of(&handle(&child)).unwrap();
    assert_eq!(graph.dependencies_of(parent_id), &[child_id]);
    assert_eq!(graph.dependents_of(child_id), &[parent_id]);

    let scheduler = Scheduler::new(many_threads());
    scheduler.add(handle(&parent));
    let report = scheduler.execute(&RecordingLogger::new());

    assert!(report.is_complete());
    assert_eq!(report.executed, 2);
    assert_eq!(timeline.starts_of("child"), 1);
    assert_eq!(timeline.starts_of("parent"), 1);
}

#[test]
fn discovery_moves_jobs_to_dependencies_collected() {
    init_tracing();
    let timeline = Timeline::new();
    let [r, a, b, c] = diamond(&timeline);
    let stranger = ProbeJob::new("stranger", &timeline);

    let mut graph = JobGraph::discover(&[handle(&r)]);

    for job in [&r, &a, &b, &c] {
        assert_eq!(graph.state_of(&handle(job)), JobState::DependenciesCollected);
    }
    assert_eq!(graph.state_of(&handle(&stranger)), JobState::Undiscovered);

    let ready = graph.initially_ready();
    assert_eq!(ready, vec![graph.id_of(&handle(&c)).unwrap()]);
    assert_eq!(graph.state_of(&handle(&c)), JobState::Ready);

    graph.mark_running(&ready);
    assert_eq!(graph.state_of(&handle(&c)), JobState::Running);

    let next = graph.complete(&ready);
    assert_eq!(next.len(), 2);
    assert_eq!(graph.state_of(&handle(&c)), JobState::Done);
    assert_eq!(graph.state_of(&handle(&a)), JobState::Ready);
    assert_eq!(graph.state_of(&handle(&r)), JobState::DependenciesCollected);
}

#[test]
fn add_then_remove_before_execute_does_not_schedule() {
    init_tracing();
    let scheduler = Scheduler::new(2);
    let counter = CounterJob::new();

    scheduler.add(handle(&counter));
    scheduler.remove(&handle(&counter));
    let report = scheduler.execute(&RecordingLogger::new());

    assert_eq!(report.executed, 0);
    assert_eq!(counter.get(), 0);
    assert!(!scheduler.contains(&handle(&counter)));
}

#[test]
fn add_then_remove_still_runs_when_reachable_as_dependency() {
    init_tracing();
    let timeline = Timeline::new();
    let parent = ProbeJob::new("parent", &timeline);
    let child = ProbeJob::new("child", &timeline);
    parent.depend_on(handle(&child));

    let scheduler = Scheduler::new(2);
    scheduler.add(handle(&parent));
    scheduler.add(handle(&child));
    scheduler.remove(&handle(&child));
    let report = scheduler.execute(&RecordingLogger::new());

    assert_eq!(report.executed, 2);
    assert_eq!(timeline.starts_of("child"), 1);
}

#[test]
fn adding_twice_registers_once() {
    init_tracing();
    let scheduler = Scheduler::new(1);
    let counter = CounterJob::new();

    scheduler.add(handle(&counter));
    scheduler.add(handle(&counter));
    assert_eq!(scheduler.len(), 1);

    scheduler.execute(&RecordingLogger::new());
    assert_eq!(counter.get(), 1);

    scheduler.remove(&handle(&counter));
    assert!(scheduler.is_empty());
}

#[test]
fn concurrent_root_set_mutation_is_consistent() {
    init_tracing();
    let scheduler = Arc::new(Scheduler::new(many_threads()));
    let counters: Vec<Arc<CounterJob>> = (0..64).map(|_| CounterJob::new()).collect();

    let workers: Vec<_> = counters
        .chunks(16)
        .map(|chunk| {
            let scheduler = Arc::clone(&scheduler);
            let chunk: Vec<Arc<CounterJob>> = chunk.to_vec();
            std::thread::spawn(move || {
                for counter in &chunk {
                    scheduler.add(handle(counter));
                    scheduler.add(handle(counter));
                }
                // Remove every other job again.
                for counter in chunk.iter().step_by(2) {
                    scheduler.remove(&handle(counter));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(scheduler.len(), 32);
    let report = scheduler.execute(&RecordingLogger::new());
    assert_eq!(report.executed, 32);

    let ran: u64 = counters.iter().map(|c| c.get()).sum();
    assert_eq!(ran, 32);
    for (i, counter) in counters.iter().enumerate() {
        let expected = if (i % 16) % 2 == 0 { 0 } else { 1 };
        assert_eq!(counter.get(), expected);
    }
}

#[test]
fn thread_threshold_limits_threads_per_round() {
    init_tracing();
    let timeline = Timeline::new();
    let probes: Vec<Arc<ProbeJob>> = (0..8)
        .map(|i| ProbeJob::new(&format!("probe_{i}"), &timeline))
        .collect();

    // 8 ready jobs, at least 8 per thread: a single (inline) thread.
    let scheduler = Scheduler::with_options(SchedulerOptions {
        max_threads: many_threads(),
        thread_threshold: 8,
    });
    for probe in &probes {
        scheduler.add(handle(probe));
    }

    let report = scheduler.execute(&RecordingLogger::new());

    assert_eq!(report.executed, 8);
    assert_eq!(report.rounds, 1);
    assert_eq!(timeline.max_concurrency(), 1);
}

#[test]
fn thread_settings_are_clamped() {
    init_tracing();
    let scheduler = Scheduler::new(0);
    assert_eq!(scheduler.max_threads(), 1);

    scheduler.set_thread_threshold(0);
    assert_eq!(scheduler.thread_threshold(), 1);

    scheduler.set_max_threads(3);
    assert_eq!(scheduler.max_threads(), 3);
}

#[test]
fn dependency_set_may_change_between_cycles() {
    init_tracing();
    let timeline = Timeline::new();
    let root = ProbeJob::new("root", &timeline);
    let first = ProbeJob::new("first", &timeline);
    let second = ProbeJob::new("second", &timeline);

    let scheduler = Scheduler::new(2);
    scheduler.add(handle(&root));

    root.depend_on(handle(&first));
    assert_eq!(scheduler.execute(&RecordingLogger::new()).executed, 2);

    root.clear_dependencies();
    root.depend_on(handle(&second));
    assert_eq!(scheduler.execute(&RecordingLogger::new()).executed, 2);

    assert_eq!(timeline.starts_of("first"), 1);
    assert_eq!(timeline.starts_of("second"), 1);
    assert_eq!(timeline.starts_of("root"), 2);
}
