//! Task abstraction for the build pipeline.
//!
//! A [`Task`] is one schedulable, retryable unit of work — building one
//! image, pushing one image. Tasks carry their own success flag and may
//! unlock dependent follow-up tasks once they succeed. Dependency ordering
//! in the pipeline is expressed entirely through follow-ups: a task for a
//! derived image is held inside its base image's task and only enqueued
//! after the base has built.

use crate::Result;

/// A schedulable unit of work.
///
/// Exactly one worker owns a task at any time; ownership transfers through
/// the work queue, so implementations never need internal synchronization
/// for their own state.
pub trait Task: Send {
    /// Stable identifier used for logging and the status board.
    ///
    /// Never used for equality or scheduling decisions.
    fn name(&self) -> &str;

    /// Perform the unit of work.
    ///
    /// Any failure is reported as `Err`; a partially completed run must not
    /// leave the task marked successful.
    fn run(&mut self) -> Result<()>;

    /// True only after a fully successful `run`.
    fn success(&self) -> bool;

    /// Clear retry-relevant state so the next attempt starts clean.
    ///
    /// Must be idempotent. The worker loop never calls this mid-run.
    fn reset(&mut self);

    /// Drain the dependent tasks unlocked by this task's success.
    ///
    /// Read once, after a successful run; draining by move guarantees each
    /// follow-up is submitted to the queue exactly once. Defaults to no
    /// follow-ups.
    fn followups(&mut self) -> Vec<Box<dyn Task>> {
        Vec::new()
    }
}

/// An item travelling through a work queue.
///
/// The shutdown sentinel is a dedicated variant so workers distinguish it
/// from real work by tag, never by value comparison.
pub enum WorkItem {
    Task(Box<dyn Task>),
    Shutdown,
}

impl WorkItem {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, WorkItem::Shutdown)
    }
}
