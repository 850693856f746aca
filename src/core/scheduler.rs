//! Round-robin dispatch with quantum bookkeeping.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::error::SimError;
use crate::core::item::WorkItem;

/// One dispatched slice in the execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceEntry {
    /// Id of the item that received the slice.
    pub id: u64,
    /// Slice length in execution units.
    pub slice: u32,
}

#[derive(Debug)]
struct SchedState {
    clock: u64,
    ready: VecDeque<WorkItem>,
    record: Vec<SliceEntry>,
}

/// Round-robin scheduler over an ordered ready sequence.
///
/// Selecting the next runnable item and simulating one quantum of execution
/// are separate operations ([`take_next`](Self::take_next) and
/// [`apply_quantum`](Self::apply_quantum)), so the scheduling policy is
/// testable without simulated timing; [`dispatch_once`](Self::dispatch_once)
/// composes them into the full dispatch step.
///
/// Fairness bound: with `n` distinct items continuously ready and none newly
/// arriving, every item receives its next quantum within at most `n − 1`
/// intervening dispatches of other items.
#[derive(Debug)]
pub struct RoundRobinScheduler {
    quantum: u32,
    state: Mutex<SchedState>,
}

impl RoundRobinScheduler {
    /// Create a scheduler with the given fixed quantum.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` if `quantum` is zero.
    pub fn new(quantum: u32) -> Result<Self, SimError> {
        if quantum == 0 {
            return Err(SimError::InvalidConfig(
                "quantum must be greater than 0".into(),
            ));
        }
        Ok(Self {
            quantum,
            state: Mutex::new(SchedState {
                clock: 0,
                ready: VecDeque::new(),
                record: Vec::new(),
            }),
        })
    }

    /// Fixed quantum in execution units.
    #[must_use]
    pub const fn quantum(&self) -> u32 {
        self.quantum
    }

    /// Sum of all dispatched slice lengths so far.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.state.lock().clock
    }

    /// Number of items awaiting or resuming execution.
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.state.lock().ready.len()
    }

    /// Copy of the append-only execution record.
    #[must_use]
    pub fn execution_record(&self) -> Vec<SliceEntry> {
        self.state.lock().record.clone()
    }

    /// Append `item` to the tail of the ready sequence.
    pub fn add_ready(&self, item: WorkItem) {
        debug_assert!(!item.is_complete(), "completed item added to ready sequence");
        self.state.lock().ready.push_back(item);
    }

    /// Remove and return the head of the ready sequence.
    ///
    /// Pure selection policy: no clock movement, no work consumed.
    pub fn take_next(&self) -> Option<WorkItem> {
        self.state.lock().ready.pop_front()
    }

    /// Consume one quantum of work from `item` and return the slice length,
    /// `min(quantum, remaining_work)`. Touches no shared state.
    pub fn apply_quantum(&self, item: &mut WorkItem) -> u32 {
        let slice = self.quantum.min(item.remaining_work());
        item.work_off(slice);
        slice
    }

    /// Advance the clock by `slice` and append `(id, slice)` to the
    /// execution record.
    pub fn record_slice(&self, id: u64, slice: u32) {
        let mut state = self.state.lock();
        state.clock += u64::from(slice);
        state.record.push(SliceEntry { id, slice });
    }

    /// One full dispatch step: select the head item, execute one quantum,
    /// record the slice.
    ///
    /// Returns `None` with no side effects if the ready sequence is empty.
    /// An item with work remaining is re-appended at the tail and `None` is
    /// returned; a completed item is returned to the caller (which becomes
    /// its unique owner, responsible for releasing resources) and is not
    /// re-enqueued.
    pub fn dispatch_once(&self) -> Option<WorkItem> {
        let mut item = self.take_next()?;
        let slice = self.apply_quantum(&mut item);
        self.record_slice(item.id(), slice);
        if item.is_complete() {
            Some(item)
        } else {
            self.add_ready(item);
            None
        }
    }
}
