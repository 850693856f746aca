//! Error types for pipeline operations.

use thiserror::Error;

/// Errors produced by pipeline components.
///
/// Admission denial and queue cancellation are deliberately NOT represented
/// here: both are normal control-flow outcomes, signalled through return
/// values (`Ok(false)` from a reservation, `None` from a cancelled pop).
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A demand vector does not match the configured resource class count.
    #[error("demand class mismatch: expected {expected} classes, got {actual}")]
    DemandMismatch {
        /// Class count the resource pool was configured with.
        expected: usize,
        /// Length of the offending demand vector.
        actual: usize,
    },
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
