pub mod config;
pub mod core;
pub mod error;
pub mod image;
pub mod log;
pub mod orchestration;

pub use config::Config;
pub use self::core::{Task, WorkItem, WorkQueue};
pub use error::{Error, Result};
pub use log::{LogLevel, Logger};
pub use orchestration::{BuildSummary, Pipeline, PipelineHandle, StatusBoard, TaskProducer};
