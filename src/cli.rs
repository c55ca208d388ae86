// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobgraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobgraph",
    version,
    about = "Run a TOML-described job graph through the dependency scheduler.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job graph file (TOML).
    ///
    /// Default: `Jobgraph.toml` in the current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of scheduler cycles to run (overrides `[scheduler].cycles`).
    #[arg(long, value_name = "N")]
    pub cycles: Option<usize>,

    /// Maximum worker threads per round (overrides `[scheduler].threads`).
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the graph, but don't execute any jobs.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
