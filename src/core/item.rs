//! Work items and pluggable workload synthesis.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::error::SimError;

/// One simulated unit of schedulable work.
///
/// Identity is immutable after construction; `remaining_work` is the only
/// mutable execution state and is decremented exclusively by the scheduler
/// during a quantum. The item is owned by exactly one pipeline stage at a
/// time — generator, queue, dispatcher, or the scheduler's ready sequence —
/// and is dropped exactly once, after its resources are released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    id: u64,
    arrival_ms: u64,
    total_work: u32,
    remaining_work: u32,
    demand: Vec<u32>,
}

impl WorkItem {
    /// Create a new work item.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DemandMismatch` if `demand.len() != class_count`
    /// and `SimError::InvalidConfig` if `total_work` is zero. Malformed
    /// demand is a precondition violation and must fail here, before the
    /// item ever reaches the resource pool.
    pub fn new(
        id: u64,
        arrival_ms: u64,
        total_work: u32,
        demand: Vec<u32>,
        class_count: usize,
    ) -> Result<Self, SimError> {
        if demand.len() != class_count {
            return Err(SimError::DemandMismatch {
                expected: class_count,
                actual: demand.len(),
            });
        }
        if total_work == 0 {
            return Err(SimError::InvalidConfig(
                "total_work must be greater than 0".into(),
            ));
        }
        Ok(Self {
            id,
            arrival_ms,
            total_work,
            remaining_work: total_work,
            demand,
        })
    }

    /// Unique, monotonically assigned identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Logical creation tick in milliseconds (informational only).
    #[must_use]
    pub const fn arrival_ms(&self) -> u64 {
        self.arrival_ms
    }

    /// Total execution units required, fixed at creation.
    #[must_use]
    pub const fn total_work(&self) -> u32 {
        self.total_work
    }

    /// Execution units still outstanding.
    #[must_use]
    pub const fn remaining_work(&self) -> u32 {
        self.remaining_work
    }

    /// Per-class resource requirements.
    #[must_use]
    pub fn demand(&self) -> &[u32] {
        &self.demand
    }

    /// Whether the item has no work left.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.remaining_work == 0
    }

    /// Consume `slice` units of remaining work. Scheduler-internal.
    pub(crate) fn work_off(&mut self, slice: u32) {
        debug_assert!(slice <= self.remaining_work, "slice exceeds remaining work");
        self.remaining_work -= slice;
    }
}

/// Demand and work values for one item, supplied by a [`WorkSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSpec {
    /// Total execution units the item will require.
    pub total_work: u32,
    /// Per-class resource requirements.
    pub demand: Vec<u32>,
}

/// Pluggable synthesis of workload parameters.
///
/// The pipeline core never randomizes demand or work values itself; the
/// external collaborator injects a source, so tests can supply
/// deterministic values in place of randomized ones.
pub trait WorkSource: Send + 'static {
    /// Produce demand/work values for the next work item.
    ///
    /// `class_count` is the configured number of resource classes; the
    /// returned demand vector is expected to match it, and the generator
    /// fails fast if it does not.
    fn next_spec(&mut self, class_count: usize) -> WorkSpec;
}

/// Deterministic work source that cycles over a fixed list of specs.
#[derive(Debug, Clone)]
pub struct StaticWorkSource {
    specs: Vec<WorkSpec>,
    cursor: usize,
}

impl StaticWorkSource {
    /// Create a source cycling over `specs` in order, forever.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` if `specs` is empty.
    pub fn new(specs: Vec<WorkSpec>) -> Result<Self, SimError> {
        if specs.is_empty() {
            return Err(SimError::InvalidConfig(
                "work source requires at least one spec".into(),
            ));
        }
        Ok(Self { specs, cursor: 0 })
    }
}

impl WorkSource for StaticWorkSource {
    fn next_spec(&mut self, _class_count: usize) -> WorkSpec {
        let spec = self.specs[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.specs.len();
        spec
    }
}

/// Monotonic identifier generator. Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator {
    /// Allocate the next identifier.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
