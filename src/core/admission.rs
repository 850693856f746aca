//! Admission control against a finite multi-class resource pool.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::error::SimError;
use crate::core::item::WorkItem;

/// Pool state guarded by a single mutex so every reservation and release is
/// linearizable: each call appears atomic to all observers.
#[derive(Debug)]
struct PoolState {
    available: Vec<u32>,
    allocations: HashMap<u64, Vec<u32>>,
}

/// Gatekeeper that atomically grants or denies resource reservations.
///
/// Conservation invariant, before and after every state-changing call:
/// `available[c] + Σ allocations[*][c] == capacity[c]` for every class `c`.
///
/// Denial is not an error — it signals the caller to retry admission later
/// (typically after re-enqueueing the item and backing off). No deadlock
/// prediction is performed; a high-demand item can starve while smaller
/// items keep being granted, and that is accepted scope.
#[derive(Debug)]
pub struct AdmissionController {
    capacity: Vec<u32>,
    state: Mutex<PoolState>,
}

impl AdmissionController {
    /// Create a pool with the given per-class capacities.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` if `capacity` is empty.
    pub fn new(capacity: Vec<u32>) -> Result<Self, SimError> {
        if capacity.is_empty() {
            return Err(SimError::InvalidConfig(
                "resource pool requires at least one class".into(),
            ));
        }
        let available = capacity.clone();
        Ok(Self {
            capacity,
            state: Mutex::new(PoolState {
                available,
                allocations: HashMap::new(),
            }),
        })
    }

    /// Number of resource classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.capacity.len()
    }

    /// Fixed per-class capacities.
    #[must_use]
    pub fn capacity(&self) -> &[u32] {
        &self.capacity
    }

    /// Atomically check and reserve the item's full demand vector.
    ///
    /// All-or-nothing: if any class cannot cover its component, no deduction
    /// is made at all and `Ok(false)` is returned. On success every class is
    /// deducted and the allocation recorded under the item's id.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DemandMismatch` if the item's demand vector length
    /// differs from the configured class count. Items are validated at
    /// construction, so hitting this indicates a logic bug in the caller.
    pub fn try_reserve(&self, item: &WorkItem) -> Result<bool, SimError> {
        let demand = item.demand();
        if demand.len() != self.capacity.len() {
            return Err(SimError::DemandMismatch {
                expected: self.capacity.len(),
                actual: demand.len(),
            });
        }

        let mut state = self.state.lock();
        let covered = demand
            .iter()
            .zip(state.available.iter())
            .all(|(needed, avail)| needed <= avail);
        if !covered {
            return Ok(false);
        }
        for (avail, needed) in state.available.iter_mut().zip(demand) {
            *avail -= needed;
        }
        state.allocations.insert(item.id(), demand.to_vec());
        Ok(true)
    }

    /// Return the item's full allocation to the pool.
    ///
    /// Idempotent: if no allocation record exists for the item this is a
    /// no-op, so duplicate release calls are safe.
    pub fn release(&self, item: &WorkItem) {
        let mut state = self.state.lock();
        let Some(held) = state.allocations.remove(&item.id()) else {
            debug!(id = item.id(), "release with no allocation record, ignoring");
            return;
        };
        for (c, (avail, freed)) in state.available.iter_mut().zip(&held).enumerate() {
            *avail += freed;
            assert!(
                *avail <= self.capacity[c],
                "available exceeds capacity for class {c}: logic bug"
            );
        }
    }

    /// Consistent point-in-time copy of per-class available units.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u32> {
        self.state.lock().available.clone()
    }

    /// Per-class sum of all currently held allocations, taken in the same
    /// critical section as the matching `available` read would be.
    #[must_use]
    pub fn allocated_totals(&self) -> Vec<u32> {
        let state = self.state.lock();
        let mut totals = vec![0u32; self.capacity.len()];
        for held in state.allocations.values() {
            for (total, units) in totals.iter_mut().zip(held) {
                *total += units;
            }
        }
        totals
    }

    /// Number of items currently holding resources.
    #[must_use]
    pub fn allocation_count(&self) -> usize {
        self.state.lock().allocations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn item(id: u64, work: u32, demand: Vec<u32>) -> WorkItem {
        let classes = demand.len();
        WorkItem::new(id, 0, work, demand, classes).unwrap()
    }

    fn assert_conserved(pool: &AdmissionController) {
        let available = pool.snapshot();
        let allocated = pool.allocated_totals();
        for (c, cap) in pool.capacity().iter().enumerate() {
            assert_eq!(available[c] + allocated[c], *cap, "class {c} not conserved");
        }
    }

    #[test]
    fn empty_class_vector_is_rejected() {
        assert!(AdmissionController::new(Vec::new()).is_err());
    }

    #[test]
    fn grant_deducts_every_class() {
        let pool = AdmissionController::new(vec![10, 10, 10]).unwrap();
        let a = item(1, 3, vec![2, 1, 4]);

        assert!(pool.try_reserve(&a).unwrap());
        assert_eq!(pool.snapshot(), vec![8, 9, 6]);
        assert_eq!(pool.allocation_count(), 1);
        assert_conserved(&pool);
    }

    #[test]
    fn denial_makes_no_partial_deduction() {
        let pool = AdmissionController::new(vec![5, 1]).unwrap();
        // First class is coverable, second is not.
        let greedy = item(1, 3, vec![2, 2]);

        let before = pool.snapshot();
        assert!(!pool.try_reserve(&greedy).unwrap());
        assert_eq!(pool.snapshot(), before);
        assert_eq!(pool.allocation_count(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let pool = AdmissionController::new(vec![4]).unwrap();
        let a = item(1, 3, vec![3]);

        assert!(pool.try_reserve(&a).unwrap());
        assert_eq!(pool.snapshot(), vec![1]);

        pool.release(&a);
        assert_eq!(pool.snapshot(), vec![4]);
        // Second release changes nothing.
        pool.release(&a);
        assert_eq!(pool.snapshot(), vec![4]);
        assert_conserved(&pool);
    }

    #[test]
    fn release_without_record_is_a_noop() {
        let pool = AdmissionController::new(vec![4]).unwrap();
        pool.release(&item(99, 1, vec![1]));
        assert_eq!(pool.snapshot(), vec![4]);
    }

    #[test]
    fn demand_length_mismatch_is_an_error() {
        let pool = AdmissionController::new(vec![4, 4]).unwrap();
        let malformed = item(1, 3, vec![1]);
        assert!(matches!(
            pool.try_reserve(&malformed),
            Err(SimError::DemandMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn denial_until_release_single_class() {
        // Admission half of the two-items-over-capacity scenario: pool [3],
        // both items demand [2].
        let pool = AdmissionController::new(vec![3]).unwrap();
        let first = item(1, 3, vec![2]);
        let second = item(2, 3, vec![2]);

        assert!(pool.try_reserve(&first).unwrap());
        assert_eq!(pool.snapshot(), vec![1]);
        assert!(!pool.try_reserve(&second).unwrap());

        pool.release(&first);
        assert_eq!(pool.snapshot(), vec![3]);
        assert!(pool.try_reserve(&second).unwrap());
        assert_conserved(&pool);
    }

    #[test]
    fn conservation_holds_under_concurrent_reserve_release() {
        let pool = Arc::new(AdmissionController::new(vec![8, 8]).unwrap());
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for i in 0..200u64 {
                    let candidate = item(t * 1000 + i, 2, vec![3, 2]);
                    if pool.try_reserve(&candidate).unwrap() {
                        pool.release(&candidate);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.snapshot(), vec![8, 8]);
        assert_eq!(pool.allocation_count(), 0);
        assert_conserved(&pool);
    }
}
