//! Configuration models for the pipeline.

pub mod sim;

pub use sim::SimConfig;
