//! Two-stage build/push pipeline.
//!
//! The pipeline owns two independent work queues and two independently
//! sized worker pools. A producer fills the build queue; build tasks place
//! their corresponding push units on the push queue as part of their own
//! success path, and their follow-up build tasks back on the build queue.
//! The pipeline polls both pending-count barriers until all reachable work
//! has succeeded or been permanently abandoned, then shuts both pools down
//! with one sentinel each.

use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::{WorkItem, WorkQueue};
use crate::log::Logger;
use crate::orchestration::status::{BuildSummary, StatusBoard};
use crate::orchestration::worker::WorkerPool;
use crate::{Error, Result};

/// How often the completion barrier is polled.
const BARRIER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded wait for worker exit after an interruption.
const INTERRUPT_GRACE: Duration = Duration::from_secs(10);

/// Source of the initial build tasks.
///
/// The producer receives both queue handles: the build queue to fill, and
/// the push queue to thread into task construction so a successful build can
/// route its own push unit. The pipeline never moves items between queues
/// itself.
pub trait TaskProducer {
    fn populate(&mut self, build_queue: &WorkQueue, push_queue: &WorkQueue) -> Result<()>;
}

/// Cloneable handle for interrupting a running pipeline.
#[derive(Clone)]
pub struct PipelineHandle {
    interrupt: CancellationToken,
}

impl PipelineHandle {
    /// Request cooperative shutdown of both pools.
    ///
    /// In-flight task attempts complete; nothing further is dequeued.
    pub fn interrupt(&self) {
        self.interrupt.cancel();
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_cancelled()
    }
}

pub struct Pipeline {
    threads: usize,
    push_threads: usize,
    retries: u32,
    build_queue: WorkQueue,
    push_queue: WorkQueue,
    board: StatusBoard,
    interrupt: CancellationToken,
    logger: Logger,
}

impl Pipeline {
    pub fn new(config: &Config, logger: Logger) -> Self {
        Self {
            threads: config.threads,
            push_threads: config.push_threads,
            retries: config.retries,
            build_queue: WorkQueue::new(),
            push_queue: WorkQueue::new(),
            board: StatusBoard::new(),
            interrupt: CancellationToken::new(),
            logger,
        }
    }

    /// Handle for interrupting the pipeline from another thread or a signal
    /// handler. Obtain before calling `run`, which consumes the pipeline.
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            interrupt: self.interrupt.clone(),
        }
    }

    /// Outcome registry shared with the workers.
    pub fn status_board(&self) -> StatusBoard {
        self.board.clone()
    }

    /// Execute the pipeline to completion.
    ///
    /// Blocks until every reachable task (including transitively discovered
    /// follow-ups) has either succeeded or exhausted its retries, then joins
    /// all workers and returns the summary. On interruption, workers are
    /// stopped cooperatively and `Error::Interrupted` is returned.
    pub fn run(self, producer: &mut dyn TaskProducer) -> Result<BuildSummary> {
        producer.populate(&self.build_queue, &self.push_queue)?;
        self.logger.info(&format!(
            "Starting pipeline: {} build task(s), {} build worker(s), {} push worker(s)",
            self.build_queue.pending(),
            self.threads,
            self.push_threads
        ));

        // Per-pool cancellation flags are children of the interrupt token,
        // so one cancel reaches every worker in both pools.
        let build_pool = WorkerPool::spawn(
            "build",
            self.threads,
            self.build_queue.clone(),
            self.retries,
            self.interrupt.child_token(),
            self.board.clone(),
            self.logger.clone(),
        )?;
        let push_pool = WorkerPool::spawn(
            "push",
            self.push_threads,
            self.push_queue.clone(),
            self.retries,
            self.interrupt.child_token(),
            self.board.clone(),
            self.logger.clone(),
        )?;

        loop {
            if self.interrupt.is_cancelled() {
                return self.shutdown_interrupted(build_pool, push_pool);
            }
            if self.build_queue.is_idle() && self.push_queue.is_idle() {
                break;
            }
            thread::sleep(BARRIER_POLL_INTERVAL);
        }

        // All work concluded; one sentinel per queue stops each pool.
        self.logger.debug("Both queues drained, shutting down workers");
        self.build_queue.put(WorkItem::Shutdown);
        self.push_queue.put(WorkItem::Shutdown);
        build_pool.join()?;
        push_pool.join()?;

        Ok(self.board.summary())
    }

    fn shutdown_interrupted(self, build_pool: WorkerPool, push_pool: WorkerPool) -> Result<BuildSummary> {
        self.logger.warn("Interrupted: waiting for in-flight attempts to finish");

        // Workers already see their cancelled child tokens; the sentinels
        // unblock any worker parked on a blocking get.
        self.build_queue.put(WorkItem::Shutdown);
        self.push_queue.put(WorkItem::Shutdown);

        build_pool.join_within(INTERRUPT_GRACE);
        push_pool.join_within(INTERRUPT_GRACE);
        Err(Error::Interrupted)
    }
}
