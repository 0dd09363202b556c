use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

fn default_threads() -> usize {
    8
}

fn default_push_threads() -> usize {
    1
}

fn default_retries() -> u32 {
    3
}

fn default_engine() -> String {
    "docker".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Build worker pool size.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Push worker pool size.
    #[serde(default = "default_push_threads")]
    pub push_threads: usize,
    /// Additional attempts after the first failed run of a task.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Push images after a successful build.
    #[serde(default)]
    pub push: bool,
    /// Container engine binary (docker, podman, ...).
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Directory for per-image log files.
    pub logs_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            push_threads: default_push_threads(),
            retries: default_retries(),
            push: false,
            engine: default_engine(),
            logs_dir: None,
        }
    }
}

impl Config {
    pub fn kiln_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".kiln"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::kiln_dir()?.join("kiln.toml"))
    }

    /// Load configuration from `path`, or defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        Ok(config)
    }

    /// Reject pool sizes and engine settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::Validation("threads must be at least 1".to_string()));
        }
        if self.push_threads == 0 {
            return Err(Error::Validation(
                "push_threads must be at least 1".to_string(),
            ));
        }
        if self.engine.trim().is_empty() {
            return Err(Error::Validation("engine must not be empty".to_string()));
        }
        Ok(())
    }

    /// Check that the configured container engine exists on PATH.
    pub fn check_engine(&self) -> Result<()> {
        which::which(&self.engine).map_err(|_| Error::EngineNotFound(self.engine.clone()))?;
        Ok(())
    }
}
