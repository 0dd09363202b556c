//! Core scheduling primitives: the task abstraction and the work queue.

pub mod queue;
pub mod task;

pub use queue::WorkQueue;
pub use task::{Task, WorkItem};
