//! # Procsim
//!
//! A concurrency-coordinated process pipeline simulator.
//!
//! This library models a minimal operating-system workload pipeline: a
//! generator synthesizes work items, a bounded FIFO queue hands them to a
//! dispatcher with blocking backpressure, an admission controller gates
//! access to a finite multi-class resource pool, and a round-robin scheduler
//! time-slices admitted items to completion.
//!
//! ## Core Pieces
//!
//! - **`BoundedQueue`**: fixed-capacity blocking FIFO hand-off between the
//!   generator and dispatcher. Producers and consumers wait on independent
//!   conditions, and a cancellation signal unblocks waiters immediately —
//!   no fixed-latency polling on the hot path.
//! - **`AdmissionController`**: atomic all-or-nothing check-and-reserve
//!   against per-class resource capacities, with idempotent release and a
//!   conservation invariant (`available + allocated == capacity` per class).
//! - **`RoundRobinScheduler`**: quantum-sliced dispatch over an ordered
//!   ready sequence, with selection and execution split into independently
//!   testable steps and an append-only execution record for observability.
//! - **`Pipeline`**: wires the above together on two dedicated OS threads
//!   and exposes the external control surface (run/pause/stop plus
//!   read-only status snapshots).
//!
//! ## Example
//!
//! ```rust,no_run
//! use procsim::config::SimConfig;
//! use procsim::core::{Pipeline, StaticWorkSource, WorkSpec};
//!
//! let source = StaticWorkSource::new(vec![WorkSpec {
//!     total_work: 4,
//!     demand: vec![1, 1, 1],
//! }])?;
//!
//! let pipeline = Pipeline::start(SimConfig::default(), source)?;
//! pipeline.set_running(true);
//! // ... later, from the controlling thread:
//! let status = pipeline.status();
//! println!("available: {:?}", status.available);
//! pipeline.stop();
//! pipeline.join();
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Admission denial is a normal control-flow outcome, not an error: denied
//! items are re-enqueued at the queue tail and retried after a fixed
//! backoff. There is no deadlock prediction; starvation of high-demand
//! items is accepted scope.

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pipeline components and concurrency coordination.
pub mod core;
/// Configuration models for the pipeline.
pub mod config;
/// Builders to construct a pipeline from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
