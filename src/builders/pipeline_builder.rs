//! Construct a running pipeline from configuration plus an injected
//! work source.

use anyhow::Context;

use crate::config::SimConfig;
use crate::core::{AppResult, Pipeline, SimError, WorkSource};

/// Validate `config` and start a pipeline with the provided work source.
///
/// # Errors
///
/// Returns `SimError::InvalidConfig` for malformed configuration and
/// `SimError::Spawn` if a worker thread cannot be started.
pub fn build_pipeline<S: WorkSource>(config: SimConfig, source: S) -> Result<Pipeline, SimError> {
    Pipeline::start(config, source)
}

/// Parse, validate, and start a pipeline from a JSON configuration string.
///
/// # Errors
///
/// Wraps parse/validation failures and spawn errors with context.
pub fn pipeline_from_json<S: WorkSource>(json: &str, source: S) -> AppResult<Pipeline> {
    let config = SimConfig::from_json_str(json)
        .map_err(|e| anyhow::anyhow!(e))
        .context("pipeline configuration rejected")?;
    build_pipeline(config, source).context("failed to start pipeline")
}
