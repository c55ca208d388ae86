// src/config/mod.rs

//! Job graph files for the `jobgraph` runner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a graph file from disk (`loader.rs`).
//! - Validate references and scheduler settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{GraphFile, JobConfig, RawGraphFile, SchedulerSection};
pub use validate::validate_config;
