//! Dependency-oblivious work queue with a pending-count barrier.
//!
//! The queue is a FIFO channel of [`WorkItem`]s plus an outstanding-items
//! counter. `put` increments the counter, `mark_done` decrements it, and the
//! counter reaching zero is the signal that every item ever enqueued —
//! including follow-ups discovered while draining — has been fully
//! processed. FIFO order is a fairness property only; the queue knows
//! nothing about dependencies between tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::core::task::WorkItem;

/// Cloneable handle to a shared work queue.
///
/// All clones drain the same channel and share the same pending counter.
#[derive(Clone)]
pub struct WorkQueue {
    tx: Sender<WorkItem>,
    rx: Receiver<WorkItem>,
    pending: Arc<AtomicUsize>,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enqueue an item, counting it as outstanding work.
    ///
    /// The sentinel is counted too; it is marked done by the worker that
    /// dequeues it, so the barrier stays accurate through shutdown.
    pub fn put(&self, item: WorkItem) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        // Every handle owns a receiver, so the channel cannot be
        // disconnected while a handle exists.
        let _ = self.tx.send(item);
    }

    /// Block until an item is available.
    pub fn get(&self) -> WorkItem {
        match self.rx.recv() {
            Ok(item) => item,
            // Unreachable while any handle is alive; treated as shutdown so
            // a worker holding a stale handle terminates instead of panicking.
            Err(_) => WorkItem::Shutdown,
        }
    }

    /// Mark one previously dequeued item as finished.
    ///
    /// Called exactly once per `get`, on every path.
    pub fn mark_done(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Outstanding items: enqueued and not yet marked done.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// True when every enqueued item has been marked done.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
