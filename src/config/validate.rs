// src/config/validate.rs

use crate::config::model::{GraphFile, RawGraphFile};
use crate::errors::{JobGraphError, Result};

impl TryFrom<RawGraphFile> for GraphFile {
    type Error = crate::errors::JobGraphError;

    fn try_from(raw: RawGraphFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(GraphFile::new_unchecked(raw.scheduler, raw.job))
    }
}

/// Validate a raw graph file without consuming it.
///
/// Dependency cycles are *not* rejected here: they are a runtime condition
/// that the scheduler detects, reports and skips on every cycle.
pub fn validate_config(cfg: &RawGraphFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawGraphFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_scheduler_section(cfg)?;
    validate_job_dependencies(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawGraphFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(JobGraphError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_section(cfg: &RawGraphFile) -> Result<()> {
    if cfg.scheduler.threads == Some(0) {
        return Err(JobGraphError::ConfigError(
            "[scheduler].threads must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.scheduler.thread_threshold == 0 {
        return Err(JobGraphError::ConfigError(
            "[scheduler].thread_threshold must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_job_dependencies(cfg: &RawGraphFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        for dep in job.after.iter() {
            if !cfg.job.contains_key(dep) {
                return Err(JobGraphError::UnknownJob(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}
