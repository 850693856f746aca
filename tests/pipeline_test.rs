//! End-to-end pipeline tests.
//!
//! These drive the public surface the way an external control surface
//! would: flip the run/stop signals, read status snapshots, and inspect the
//! execution record afterwards.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use procsim::config::SimConfig;
use procsim::core::{
    AdmissionController, Pipeline, RoundRobinScheduler, StaticWorkSource, WorkItem, WorkSource,
    WorkSpec,
};

fn fast_config(resource_capacity: Vec<u32>) -> SimConfig {
    procsim::util::init_tracing();
    SimConfig {
        queue_capacity: 4,
        resource_capacity,
        quantum: 2,
        inter_arrival_ms: 1,
        poll_interval_ms: 5,
        retry_backoff_ms: 1,
    }
}

fn item(id: u64, work: u32, demand: Vec<u32>) -> WorkItem {
    let classes = demand.len();
    WorkItem::new(id, 0, work, demand, classes).unwrap()
}

/// Two items over a one-class pool of 3 units, each demanding 2, work 3,
/// quantum 2: the second must be denied until the first completes and
/// releases.
#[test]
fn contended_admission_grants_after_release() {
    let pool = AdmissionController::new(vec![3]).unwrap();
    let sched = RoundRobinScheduler::new(2).unwrap();

    let first = item(1, 3, vec![2]);
    let second = item(2, 3, vec![2]);

    assert!(pool.try_reserve(&first).unwrap());
    sched.add_ready(first);
    assert!(sched.dispatch_once().is_none()); // slice 2, work remains

    // 2 > 1 available while the first item still holds its allocation.
    assert!(!pool.try_reserve(&second).unwrap());

    let done = sched.dispatch_once().expect("slice 1 completes the item");
    pool.release(&done);
    assert_eq!(pool.snapshot(), vec![3]);

    assert!(pool.try_reserve(&second).unwrap());
    let record = sched.execution_record();
    assert_eq!(record.len(), 2);
    assert_eq!(record[0].slice, 2);
    assert_eq!(record[1].slice, 1);
}

#[test]
fn pipeline_completes_work_end_to_end() {
    let source = StaticWorkSource::new(vec![WorkSpec {
        total_work: 4,
        demand: vec![1, 1, 1],
    }])
    .unwrap();
    let config = fast_config(vec![2, 2, 2]);
    let capacity = config.resource_capacity.clone();
    let quantum = config.quantum;

    let pipeline = Pipeline::start(config, source).unwrap();
    pipeline.set_running(true);
    std::thread::sleep(Duration::from_millis(300));
    pipeline.stop();

    let status = pipeline.status();
    let record = pipeline.execution_record();
    pipeline.join();

    assert!(!record.is_empty(), "pipeline made no progress");
    assert_eq!(record[0].id, 1, "first dispatch must be the first arrival");
    for entry in &record {
        assert!(entry.slice > 0 && entry.slice <= quantum);
    }
    for (avail, cap) in status.available.iter().zip(&capacity) {
        assert!(avail <= cap);
    }
}

/// With a pool of one unit per class and items that cannot finish in a
/// single pass, every later item is denied and the queue backs up until the
/// generator blocks in push. Stop must still unblock everything promptly.
#[test]
fn denial_backpressure_still_terminates() {
    let source = StaticWorkSource::new(vec![WorkSpec {
        total_work: 4,
        demand: vec![1, 1, 1],
    }])
    .unwrap();
    let config = fast_config(vec![1, 1, 1]);
    let queue_capacity = config.queue_capacity;

    let pipeline = Pipeline::start(config, source).unwrap();
    pipeline.set_running(true);
    std::thread::sleep(Duration::from_millis(250));

    let status = pipeline.status();
    let record = pipeline.execution_record();

    // The first item got one quantum and still holds the whole pool.
    assert_eq!(record.len(), 1);
    assert_eq!(record[0].id, 1);
    assert_eq!(record[0].slice, 2);
    assert_eq!(status.available, vec![0, 0, 0]);
    assert_eq!(status.ready_len, 1);
    // The dispatcher may be mid requeue when sampled, so allow one in-flight
    // item below full.
    assert!(status.queue_len >= queue_capacity - 1);

    let start = Instant::now();
    pipeline.stop();
    pipeline.join();
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "stop did not unblock the workers"
    );
}

#[test]
fn stop_unblocks_dispatcher_parked_in_pop() {
    let source = StaticWorkSource::new(vec![WorkSpec {
        total_work: 2,
        demand: vec![1],
    }])
    .unwrap();
    let mut config = fast_config(vec![4]);
    // One item arrives, then the generator idles for a minute: the
    // dispatcher drains it and parks inside pop.
    config.inter_arrival_ms = 60_000;

    let pipeline = Pipeline::start(config, source).unwrap();
    pipeline.set_running(true);
    std::thread::sleep(Duration::from_millis(150));

    let start = Instant::now();
    pipeline.stop();
    pipeline.join();
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "blocked workers outlived the stop signal"
    );
}

#[test]
fn paused_pipeline_stays_inert_and_resumes() {
    let source = StaticWorkSource::new(vec![WorkSpec {
        total_work: 2,
        demand: vec![1],
    }])
    .unwrap();
    let pipeline = Pipeline::start(fast_config(vec![4]), source).unwrap();

    // Workers start paused: nothing may flow.
    std::thread::sleep(Duration::from_millis(60));
    assert!(pipeline.execution_record().is_empty());
    assert_eq!(pipeline.status().queue_len, 0);

    pipeline.set_running(true);
    std::thread::sleep(Duration::from_millis(150));
    assert!(!pipeline.execution_record().is_empty());

    // Pausing freezes the record once in-flight steps drain.
    pipeline.set_running(false);
    std::thread::sleep(Duration::from_millis(50));
    let frozen = pipeline.execution_record().len();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(pipeline.execution_record().len(), frozen);

    pipeline.stop();
    pipeline.join();
}

/// Seeded random workload; asserts structural invariants rather than exact
/// timing.
struct RandomSource {
    rng: StdRng,
}

impl WorkSource for RandomSource {
    fn next_spec(&mut self, class_count: usize) -> WorkSpec {
        WorkSpec {
            total_work: self.rng.random_range(2..=6),
            demand: (0..class_count)
                .map(|_| self.rng.random_range(1..=2))
                .collect(),
        }
    }
}

#[test]
fn randomized_workload_preserves_invariants() {
    let config = fast_config(vec![10, 10, 10]);
    let capacity = config.resource_capacity.clone();
    let quantum = config.quantum;

    let pipeline = Pipeline::start(
        config,
        RandomSource {
            rng: StdRng::seed_from_u64(42),
        },
    )
    .unwrap();
    pipeline.set_running(true);
    std::thread::sleep(Duration::from_millis(400));
    pipeline.stop();

    let status = pipeline.status();
    let record = pipeline.execution_record();
    pipeline.join();

    assert!(!record.is_empty());
    let mut clock = 0u64;
    for entry in &record {
        assert!(entry.slice > 0 && entry.slice <= quantum);
        clock += u64::from(entry.slice);
    }
    assert!(clock > 0);
    for (avail, cap) in status.available.iter().zip(&capacity) {
        assert!(avail <= cap, "available exceeded capacity");
    }
}
