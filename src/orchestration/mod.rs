//! Orchestration layer: worker pools, the two-stage pipeline, and outcome
//! tracking.

mod pipeline;
mod status;
mod worker;

pub use pipeline::{Pipeline, PipelineHandle, TaskProducer};
pub use status::{BuildSummary, StatusBoard};
pub use worker::WorkerPool;
