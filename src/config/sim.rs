//! Pipeline configuration structure.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pipeline configuration.
///
/// All values are fixed for the pipeline's lifetime — there is no live
/// reconfiguration. Defaults mirror the classic simulator constants: a
/// ten-slot queue, three resource classes of ten units, quantum two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Bounded queue capacity (slots between generator and dispatcher).
    pub queue_capacity: usize,
    /// Total units per resource class; the vector length is the class count.
    pub resource_capacity: Vec<u32>,
    /// Maximum execution-unit slice granted per dispatch turn.
    pub quantum: u32,
    /// Generator delay between produced items, in milliseconds.
    pub inter_arrival_ms: u64,
    /// Idle-poll interval while the pipeline is paused, in milliseconds.
    pub poll_interval_ms: u64,
    /// Dispatcher delay after a denied reservation, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            resource_capacity: vec![10, 10, 10],
            quantum: 2,
            inter_arrival_ms: 2000,
            poll_interval_ms: 200,
            retry_backoff_ms: 500,
        }
    }
}

impl SimConfig {
    /// Validate configuration values.
    ///
    /// `inter_arrival_ms` and `retry_backoff_ms` may be zero (useful for
    /// tests that want maximum throughput); the pause poll interval may not,
    /// since a zero interval would spin.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the first violated rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        if self.resource_capacity.is_empty() {
            return Err("resource_capacity must define at least one class".into());
        }
        if self.quantum == 0 {
            return Err("quantum must be greater than 0".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse failure or validation violation.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Generator inter-arrival delay.
    #[must_use]
    pub const fn inter_arrival(&self) -> Duration {
        Duration::from_millis(self.inter_arrival_ms)
    }

    /// Pause idle-poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Denied-reservation retry backoff.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
