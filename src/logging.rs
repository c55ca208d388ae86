// src/logging.rs

//! Logging for `jobgraph`.
//!
//! Two layers live here:
//! - [`Logger`], the sink the scheduler reports cycle errors and job faults
//!   to. Callers pass one into [`Scheduler::execute`](crate::dag::Scheduler::execute),
//!   which makes it easy to capture diagnostics per scheduler (or per test).
//! - [`init_logging`], the global `tracing` + `tracing-subscriber` setup used
//!   by the `jobgraph` binary.
//!
//! Priority for determining the global log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `JOBGRAPH_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout only carries the runner summary.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Destination for scheduler-level diagnostics.
///
/// Implementations must be callable from the controlling thread of an
/// execution call; the scheduler never logs through it from worker threads.
pub trait Logger: Send + Sync {
    fn error(&self, message: &str);

    fn warn(&self, message: &str);

    fn info(&self, _message: &str) {}
}

/// [`Logger`] that forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "jobgraph::scheduler", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "jobgraph::scheduler", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "jobgraph::scheduler", "{message}");
    }
}

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("JOBGRAPH_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
