//! Logging for the build pipeline.
//!
//! Log levels:
//! - ERROR: Failures that abandon a task or abort the pipeline
//! - WARN: Unexpected but recoverable conditions (failed attempts, slow exits)
//! - INFO: High-level progress (task attempts, queue events, shutdown)
//! - DEBUG: Detailed traces (worker lifecycle, barrier polling)
//!
//! There is no global logger. A [`Logger`] handle is constructed once at
//! process start and passed to every component that needs one; its lifetime
//! is tied to the process, not to ambient module state. Handles are cheap to
//! clone, and `scoped()` derives a handle that tags lines with an image name
//! and mirrors them into a per-image log file when a logs directory is
//! configured.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Log levels for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

struct Inner {
    level: LogLevel,
    quiet: bool,
    logs_dir: Option<PathBuf>,
}

/// Explicit logging handle.
///
/// Cloning is cheap; all clones share the same level and sink configuration.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
    scope: Option<String>,
}

impl Logger {
    /// Create the root logger.
    ///
    /// `quiet` suppresses all console output; per-scope log files are still
    /// written. `logs_dir` enables per-scope log files for scoped handles.
    pub fn new(level: LogLevel, quiet: bool, logs_dir: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                level,
                quiet,
                logs_dir,
            }),
            scope: None,
        }
    }

    /// A logger that discards everything. Used by tests.
    pub fn disabled() -> Self {
        Self::new(LogLevel::Error, true, None)
    }

    /// Derive a handle tagged with a scope (typically an image name).
    ///
    /// When a logs directory is configured, lines from the scoped handle are
    /// also appended to `<logs_dir>/<scope>.log`.
    pub fn scoped(&self, scope: &str) -> Logger {
        Self {
            inner: Arc::clone(&self.inner),
            scope: Some(scope.to_string()),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.inner.level
    }

    fn write(&self, level: LogLevel, msg: &str) {
        if level > self.inner.level {
            return;
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let line = match &self.scope {
            Some(scope) => format!("[{}] [{:5}] [{}] {}", timestamp, level.as_str(), scope, msg),
            None => format!("[{}] [{:5}] {}", timestamp, level.as_str(), msg),
        };

        if !self.inner.quiet {
            eprintln!("{}", line);
        }

        // Per-image log file, opened in append mode on each write so handles
        // stay trivially cloneable across worker threads.
        if let (Some(dir), Some(scope)) = (&self.inner.logs_dir, &self.scope) {
            let path = dir.join(format!("{}.log", scope));
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    pub fn error(&self, msg: &str) {
        self.write(LogLevel::Error, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.write(LogLevel::Warn, msg);
    }

    pub fn info(&self, msg: &str) {
        self.write(LogLevel::Info, msg);
    }

    pub fn debug(&self, msg: &str) {
        self.write(LogLevel::Debug, msg);
    }
}
