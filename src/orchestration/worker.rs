//! Fixed-size worker pool draining one work queue.
//!
//! Each worker runs the same loop: dequeue, retry the task up to the
//! configured budget, enqueue its follow-ups on success, mark the item done.
//! Shutdown uses a self-propagating sentinel: the orchestrator places one
//! [`WorkItem::Shutdown`] on the queue, and the first worker to dequeue it
//! re-enqueues it before terminating so every remaining worker observes it
//! too. One sentinel stops a pool of any size.
//!
//! Cancellation is cooperative. The pool's token is checked at the top of
//! the loop and before each retry attempt, never mid-run: an in-flight
//! attempt always completes.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::core::{WorkItem, WorkQueue};
use crate::log::Logger;
use crate::orchestration::status::StatusBoard;
use crate::{Error, Result};

/// A group of parallel workers bound to one queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
    logger: Logger,
}

impl WorkerPool {
    /// Spawn `size` named worker threads draining `queue`.
    ///
    /// `retries` is the number of additional attempts after the first, so a
    /// task runs at most `retries + 1` times. Workers record every task's
    /// final outcome on `board`.
    pub fn spawn(
        label: &str,
        size: usize,
        queue: WorkQueue,
        retries: u32,
        cancel: CancellationToken,
        board: StatusBoard,
        logger: Logger,
    ) -> Result<Self> {
        let mut handles = Vec::with_capacity(size);
        for n in 0..size {
            let queue = queue.clone();
            let cancel = cancel.clone();
            let board = board.clone();
            let logger = logger.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", label, n))
                .spawn(move || worker_loop(queue, retries, cancel, board, logger))?;
            handles.push(handle);
        }
        Ok(Self {
            handles,
            cancel,
            logger,
        })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Tell every worker to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for all workers to exit.
    ///
    /// Only safe to call once a sentinel has been enqueued (or the pool
    /// cancelled with a non-empty queue); otherwise workers stay parked on
    /// `get` forever.
    pub fn join(self) -> Result<()> {
        for handle in self.handles {
            handle
                .join()
                .map_err(|_| Error::WorkerJoin("worker thread panicked".to_string()))?;
        }
        Ok(())
    }

    /// Best-effort bounded wait for worker exit.
    ///
    /// Returns true when every worker exited within the grace period.
    /// Stragglers are detached; they never block process exit.
    pub fn join_within(self, grace: Duration) -> bool {
        let WorkerPool {
            handles, logger, ..
        } = self;
        let deadline = Instant::now() + grace;
        loop {
            if handles.iter().all(|h| h.is_finished()) {
                for handle in handles {
                    let _ = handle.join();
                }
                return true;
            }
            if Instant::now() >= deadline {
                let stuck = handles.iter().filter(|h| !h.is_finished()).count();
                logger.warn(&format!(
                    "{} worker(s) still running after grace period, detaching",
                    stuck
                ));
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

fn worker_loop(
    queue: WorkQueue,
    retries: u32,
    cancel: CancellationToken,
    board: StatusBoard,
    logger: Logger,
) {
    let worker = thread::current()
        .name()
        .unwrap_or("worker")
        .to_string();

    loop {
        if cancel.is_cancelled() {
            logger.debug(&format!("{} stopping on cancellation", worker));
            break;
        }

        let mut task = match queue.get() {
            WorkItem::Shutdown => {
                // Propagate the sentinel so the remaining workers see it too.
                queue.put(WorkItem::Shutdown);
                queue.mark_done();
                logger.debug(&format!("{} observed shutdown sentinel", worker));
                break;
            }
            WorkItem::Task(task) => task,
        };

        for attempt in 0..=retries {
            if cancel.is_cancelled() {
                logger.info(&format!(
                    "Abandoning task {} before attempt {}",
                    task.name(),
                    attempt + 1
                ));
                break;
            }
            logger.info(&format!(
                "Attempt {}/{} for task {}",
                attempt + 1,
                retries + 1,
                task.name()
            ));
            match task.run() {
                Ok(()) if task.success() => break,
                Ok(()) => logger.warn(&format!(
                    "Task {} returned without reporting success",
                    task.name()
                )),
                Err(err) => logger.error(&format!(
                    "Task {} attempt {} failed: {}",
                    task.name(),
                    attempt + 1,
                    err
                )),
            }
            task.reset();
        }

        if task.success() {
            if !cancel.is_cancelled() {
                for next in task.followups() {
                    logger.info(&format!("Queued follow-up task {}", next.name()));
                    queue.put(WorkItem::Task(next));
                }
            }
        } else {
            // Permanent failure: the follow-up subtree is pruned with it.
            logger.error(&format!("Giving up on task {}", task.name()));
        }

        board.record(task.name(), task.success());
        queue.mark_done();
    }
}
