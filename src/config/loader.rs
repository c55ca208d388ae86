// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{GraphFile, RawGraphFile};
use crate::errors::Result;

/// Load a job graph file from a given path and return the raw `RawGraphFile`.
///
/// This only performs TOML deserialization; it does **not** check that
/// dependencies refer to known jobs. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawGraphFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents)
}

/// Parse a job graph description from TOML text.
pub fn load_from_str(contents: &str) -> Result<RawGraphFile> {
    let config: RawGraphFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a job graph file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for unknown `after` references and nonsensical scheduler values.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<GraphFile> {
    let raw_config = load_from_path(&path)?;
    let config = GraphFile::try_from(raw_config)?;
    Ok(config)
}

/// Default graph file: `Jobgraph.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Jobgraph.toml")
}
