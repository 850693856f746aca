//! Pipeline wiring: worker threads and the external control surface.
//!
//! Two long-lived OS threads run the pipeline: the generator synthesizes
//! work items and pushes them into the bounded queue; the dispatcher pops
//! items, negotiates admission, and round-robin-dispatches admitted work.
//! A third, external thread (the control surface) only flips the shared
//! run/stop signals and reads snapshots — it never touches the ready
//! sequence or the allocation map directly.
//!
//! Lock ordering: the resource pool and the scheduler each guard their own
//! short critical section. In this design they are never held concurrently
//! (the dispatcher sequences reserve → schedule → release), but any future
//! path that must hold both acquires the pool section strictly before the
//! scheduler section.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::SimConfig;
use crate::core::admission::AdmissionController;
use crate::core::control::ControlState;
use crate::core::error::SimError;
use crate::core::item::{IdGenerator, WorkItem, WorkSource};
use crate::core::queue::BoundedQueue;
use crate::core::scheduler::{RoundRobinScheduler, SliceEntry};
use crate::util::clock::now_ms;

/// Point-in-time view of pipeline state for an external control surface.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Available units per resource class.
    pub available: Vec<u32>,
    /// Items awaiting or resuming execution in the ready sequence.
    pub ready_len: usize,
    /// Items in transit between generator and dispatcher.
    pub queue_len: usize,
}

/// A running process pipeline: generator and dispatcher threads plus the
/// shared components they coordinate through.
///
/// Workers start paused; call [`set_running`](Self::set_running) to begin
/// producing and dispatching. Denied items are re-enqueued at the queue
/// tail unconditionally, which can starve a high-demand item while smaller
/// items keep being granted — a known fairness trade-off, not a bug.
#[derive(Debug)]
pub struct Pipeline {
    control: Arc<ControlState>,
    queue: Arc<BoundedQueue<WorkItem>>,
    admission: Arc<AdmissionController>,
    scheduler: Arc<RoundRobinScheduler>,
    workers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Build all components from `config` and spawn both worker threads.
    ///
    /// Workload parameters come from the injected `source`; configuration
    /// is fixed for the pipeline's lifetime.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` for malformed configuration and
    /// `SimError::Spawn` if a worker thread cannot be started.
    pub fn start<S: WorkSource>(config: SimConfig, source: S) -> Result<Self, SimError> {
        config.validate().map_err(SimError::InvalidConfig)?;

        let control = Arc::new(ControlState::new());
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity)?);
        let admission = Arc::new(AdmissionController::new(config.resource_capacity.clone())?);
        let scheduler = Arc::new(RoundRobinScheduler::new(config.quantum)?);

        let generator = thread::Builder::new().name("procsim-gen".into()).spawn({
            let control = Arc::clone(&control);
            let queue = Arc::clone(&queue);
            let class_count = admission.class_count();
            let inter_arrival = config.inter_arrival();
            let poll = config.poll_interval();
            move || generator_loop(source, &control, &queue, class_count, inter_arrival, poll)
        })?;

        let dispatcher = thread::Builder::new()
            .name("procsim-dispatch".into())
            .spawn({
                let control = Arc::clone(&control);
                let queue = Arc::clone(&queue);
                let admission = Arc::clone(&admission);
                let scheduler = Arc::clone(&scheduler);
                let backoff = config.retry_backoff();
                let poll = config.poll_interval();
                move || dispatcher_loop(&control, &queue, &admission, &scheduler, backoff, poll)
            })?;

        info!(
            queue_capacity = config.queue_capacity,
            classes = admission.class_count(),
            quantum = config.quantum,
            "pipeline started (paused)"
        );

        Ok(Self {
            control,
            queue,
            admission,
            scheduler,
            workers: vec![generator, dispatcher],
        })
    }

    /// Set the shared `running` signal. While cleared, both workers
    /// idle-poll without producing or consuming.
    pub fn set_running(&self, running: bool) {
        info!(running, "run signal changed");
        self.control.set_running(running);
    }

    /// Assert the `stop` signal and cancel the queue so a blocked pop (or
    /// push) unblocks immediately. Irreversible.
    pub fn stop(&self) {
        info!("stop requested");
        self.control.request_stop();
        self.queue.cancel();
    }

    /// Wait for both worker threads to exit. Call [`stop`](Self::stop)
    /// first; otherwise this blocks until someone does.
    pub fn join(mut self) {
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("worker thread panicked");
            }
        }
        info!("pipeline terminated");
    }

    /// Consistent resource snapshot plus queue/ready occupancy.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            available: self.admission.snapshot(),
            ready_len: self.scheduler.ready_len(),
            queue_len: self.queue.len(),
        }
    }

    /// Copy of the append-only execution record for display.
    #[must_use]
    pub fn execution_record(&self) -> Vec<SliceEntry> {
        self.scheduler.execution_record()
    }
}

/// Generator worker: synthesize items and push them into the queue at a
/// fixed inter-arrival cadence; idle-poll while paused.
fn generator_loop<S: WorkSource>(
    mut source: S,
    control: &ControlState,
    queue: &BoundedQueue<WorkItem>,
    class_count: usize,
    inter_arrival: Duration,
    poll: Duration,
) {
    debug!("generator started");
    let ids = IdGenerator::default();

    while !control.stop_requested() {
        if !control.is_running() {
            control.idle(poll);
            continue;
        }

        let spec = source.next_spec(class_count);
        let item = match WorkItem::new(
            ids.next_id(),
            now_ms(),
            spec.total_work,
            spec.demand,
            class_count,
        ) {
            Ok(item) => item,
            Err(e) => {
                error!(error = %e, "work source produced a malformed spec");
                control.request_stop();
                queue.cancel();
                break;
            }
        };

        let id = item.id();
        if queue.push(item).is_err() {
            // Cancelled while waiting for a slot; ownership came back and
            // the item is dropped here.
            break;
        }
        debug!(id, "work item generated");

        if control.idle(inter_arrival) {
            break;
        }
    }
    debug!("generator exiting");
}

/// Dispatcher worker: pop, negotiate admission, dispatch one quantum, and
/// release on completion; re-enqueue and back off on denial.
fn dispatcher_loop(
    control: &ControlState,
    queue: &BoundedQueue<WorkItem>,
    admission: &AdmissionController,
    scheduler: &RoundRobinScheduler,
    backoff: Duration,
    poll: Duration,
) {
    debug!("dispatcher started");

    while !control.stop_requested() {
        if !control.is_running() {
            control.idle(poll);
            continue;
        }

        // Blocks until an item arrives or the queue is cancelled; the loop
        // condition re-observes stop after every wakeup.
        let Some(item) = queue.pop() else {
            continue;
        };

        match admission.try_reserve(&item) {
            Ok(true) => {
                info!(id = item.id(), demand = ?item.demand(), "resources reserved");
                scheduler.add_ready(item);
                if let Some(done) = scheduler.dispatch_once() {
                    admission.release(&done);
                    info!(id = done.id(), clock = scheduler.clock(), "work item completed");
                }
            }
            Ok(false) => {
                debug!(id = item.id(), "admission denied, re-enqueueing");
                if queue.push(item).is_err() {
                    break;
                }
                if control.idle(backoff) {
                    break;
                }
            }
            Err(e) => {
                // Demand length is validated at item construction, so a
                // mismatch here is a logic bug, not a runtime condition.
                unreachable!("admission precondition violated: {e}");
            }
        }
    }
    debug!("dispatcher exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::{StaticWorkSource, WorkSpec};

    fn small_config() -> SimConfig {
        SimConfig {
            queue_capacity: 4,
            resource_capacity: vec![4, 4],
            quantum: 2,
            inter_arrival_ms: 1,
            poll_interval_ms: 5,
            retry_backoff_ms: 1,
        }
    }

    fn unit_source() -> StaticWorkSource {
        StaticWorkSource::new(vec![WorkSpec {
            total_work: 4,
            demand: vec![1, 1],
        }])
        .unwrap()
    }

    #[test]
    fn paused_pipeline_produces_nothing() {
        let pipeline = Pipeline::start(small_config(), unit_source()).unwrap();
        std::thread::sleep(Duration::from_millis(60));

        let status = pipeline.status();
        assert_eq!(status.queue_len, 0);
        assert_eq!(status.ready_len, 0);
        assert!(pipeline.execution_record().is_empty());

        pipeline.stop();
        pipeline.join();
    }

    #[test]
    fn invalid_config_fails_at_start() {
        let mut config = small_config();
        config.quantum = 0;
        assert!(Pipeline::start(config, unit_source()).is_err());
    }

    #[test]
    fn malformed_source_stops_the_pipeline() {
        // Demand length 1 against two configured classes: the generator must
        // fail fast and shut the pipeline down on its own.
        let bad_source = StaticWorkSource::new(vec![WorkSpec {
            total_work: 4,
            demand: vec![1],
        }])
        .unwrap();

        let pipeline = Pipeline::start(small_config(), bad_source).unwrap();
        pipeline.set_running(true);
        std::thread::sleep(Duration::from_millis(100));

        assert!(pipeline.execution_record().is_empty());
        pipeline.stop();
        pipeline.join();
    }
}
