//! Bounded blocking FIFO hand-off between generator and dispatcher.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::core::error::SimError;

/// Interior queue state. The mutex around this is held only for slot
/// mutation; all waiting happens on the condvars with the lock released.
#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    cancelled: bool,
}

/// Fixed-capacity FIFO channel with blocking, cancellable hand-off.
///
/// `push` blocks while the queue is full, `pop` blocks while it is empty.
/// Producers wait on `not_full` and consumers on `not_empty` — two
/// independent conditions, so the two sides never contend on the same
/// wakeup. Blocking absorbs bursts up to the capacity without unbounded
/// memory growth and without busy CPU use on the hot path.
///
/// Cancellation is the one non-FIFO concern: [`BoundedQueue::cancel`]
/// notifies both condvars, so a blocked `pop` returns `None` (once drained)
/// and a blocked `push` hands its item back instead of waiting forever.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, SimError> {
        if capacity == 0 {
            return Err(SimError::InvalidConfig(
                "queue capacity must be greater than 0".into(),
            ));
        }
        Ok(Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                cancelled: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Insert `item` at the tail, blocking while the queue is full.
    ///
    /// Never drops or reorders items.
    ///
    /// # Errors
    ///
    /// If the queue is cancelled — before the call or while waiting for a
    /// slot — the item is handed back so the caller keeps ownership.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        loop {
            if state.cancelled {
                return Err(item);
            }
            if state.items.len() < self.capacity {
                break;
            }
            self.not_full.wait(&mut state);
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the head item, blocking while the queue is empty.
    ///
    /// Items come out in strict FIFO order. Returns `None` only once the
    /// queue is cancelled and drained; callers must treat that as "stop
    /// processing", not as a transient error.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.cancelled {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Assert the cancellation signal and wake every blocked producer and
    /// consumer. Idempotent.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.cancelled = true;
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Whether cancellation has been asserted.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Number of items currently in transit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether the queue currently holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Fixed capacity set at construction.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
