//! Core pipeline components and concurrency coordination.

pub mod admission;
pub mod control;
pub mod error;
pub mod item;
pub mod pipeline;
pub mod queue;
pub mod scheduler;

pub use admission::AdmissionController;
pub use control::ControlState;
pub use error::{AppResult, SimError};
pub use item::{IdGenerator, StaticWorkSource, WorkItem, WorkSource, WorkSpec};
pub use pipeline::{Pipeline, StatusSnapshot};
pub use queue::BoundedQueue;
pub use scheduler::{RoundRobinScheduler, SliceEntry};
