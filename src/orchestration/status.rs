//! Per-task outcome tracking, queried after the pipeline drains.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Shared registry of final task outcomes.
///
/// Workers record each task's final success state after its retry loop
/// finishes; the CLI reads the summary once both queues have drained.
#[derive(Clone, Default)]
pub struct StatusBoard {
    outcomes: Arc<Mutex<BTreeMap<String, bool>>>,
}

/// Final outcomes of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl BuildSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a task's final outcome. A later record for the same name wins;
    /// in practice each task is recorded once because exactly one worker
    /// owns it.
    pub fn record(&self, name: &str, success: bool) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(name.to_string(), success);
        }
    }

    /// Final success state for one task, if it was processed.
    pub fn outcome(&self, name: &str) -> Option<bool> {
        self.outcomes.lock().ok().and_then(|o| o.get(name).copied())
    }

    /// Number of tasks recorded so far.
    pub fn len(&self) -> usize {
        self.outcomes.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> BuildSummary {
        let outcomes = self
            .outcomes
            .lock()
            .map(|o| o.clone())
            .unwrap_or_default();
        let (ok, bad): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|(_, s)| *s);
        BuildSummary {
            succeeded: ok.into_iter().map(|(n, _)| n).collect(),
            failed: bad.into_iter().map(|(n, _)| n).collect(),
        }
    }
}
