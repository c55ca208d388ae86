// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod job;
pub mod logging;
pub mod pool;
pub mod runner;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::model::GraphFile;
use crate::dag::Scheduler;
use crate::logging::TracingLogger;
use crate::runner::{register_roots, run_cycles, GraphJobs};

pub use crate::dag::{ExecutionReport, JobState};
pub use crate::job::{DependencySink, FnJob, Job, JobHandle};
pub use crate::logging::Logger;
pub use crate::pool::{ThreadInfo, WorkerPool};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - graph file loading
/// - scheduler construction (with CLI overrides)
/// - job construction and root registration
/// - the cycle loop and its summary output
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    debug!(path = %config_path.display(), "loading job graph");
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let scheduler = Scheduler::from_config(&cfg.scheduler);
    if let Some(threads) = args.threads {
        scheduler.set_max_threads(threads);
    }

    let jobs = GraphJobs::build(&cfg)?;
    register_roots(&cfg, &jobs, &scheduler)?;

    let cycles = args.cycles.unwrap_or(cfg.scheduler.cycles);
    let reports = run_cycles(&scheduler, cycles, &TracingLogger);

    for (cycle, report) in reports.iter().enumerate() {
        println!("cycle {cycle}: {}", report.summary());
    }

    println!("executions per job:");
    for name in jobs.names() {
        println!("  {name}: {}", jobs.executions(name).unwrap_or(0));
    }

    Ok(())
}

/// Simple dry-run output: print scheduler settings and the job graph.
fn print_dry_run(cfg: &GraphFile) {
    println!("jobgraph dry-run");
    match cfg.scheduler.threads {
        Some(threads) => println!("  scheduler.threads = {threads}"),
        None => println!(
            "  scheduler.threads = {} (available parallelism)",
            dag::default_thread_count()
        ),
    }
    println!("  scheduler.thread_threshold = {}", cfg.scheduler.thread_threshold);
    println!("  scheduler.cycles = {}", cfg.scheduler.cycles);
    println!();

    println!("jobs ({}):", cfg.job.len());
    for (name, job) in cfg.job.iter() {
        println!("  - {name}");
        if !job.after.is_empty() {
            println!("      after: {:?}", job.after);
        }
        if job.work_us > 0 {
            println!("      work_us: {}", job.work_us);
        }
        if !job.root {
            println!("      root: false");
        }
        if job.panic {
            println!("      panic: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
