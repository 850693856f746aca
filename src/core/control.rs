//! Shared run/pause/stop control plane.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Flags {
    running: bool,
    stop: bool,
}

/// Control signals shared between the external controller and both worker
/// loops.
///
/// An explicit state object passed by `Arc` into each worker, rather than
/// process-wide globals, so multiple independent pipelines can coexist.
/// `running` and `stop` are mutated only by the controlling thread; workers
/// observe them at loop boundaries (cancellation is cooperative, never
/// preemptive — a worker mid-step finishes that step first).
///
/// [`idle`](Self::idle) replaces fixed-interval sleep polling: it waits on a
/// condvar that every flag change notifies, so a paused or backing-off
/// worker wakes as soon as `stop` (or a pause flip) arrives instead of after
/// a full interval.
#[derive(Debug, Default)]
pub struct ControlState {
    flags: Mutex<Flags>,
    changed: Condvar,
}

impl ControlState {
    /// Create a control state with `running = false`, `stop = false`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `running` signal and wake idle workers.
    pub fn set_running(&self, running: bool) {
        let mut flags = self.flags.lock();
        flags.running = running;
        drop(flags);
        self.changed.notify_all();
    }

    /// Assert the `stop` signal and wake idle workers. Irreversible.
    pub fn request_stop(&self) {
        let mut flags = self.flags.lock();
        flags.stop = true;
        drop(flags);
        self.changed.notify_all();
    }

    /// Whether the `running` signal is currently set.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flags.lock().running
    }

    /// Whether `stop` has been asserted.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.flags.lock().stop
    }

    /// Sleep for at most `duration`, waking early on any signal change.
    ///
    /// Returns whether stop has been requested, so worker loops can exit
    /// without a second flag read.
    pub fn idle(&self, duration: Duration) -> bool {
        let mut flags = self.flags.lock();
        if !flags.stop {
            let _timeout = self.changed.wait_for(&mut flags, duration);
        }
        flags.stop
    }
}
