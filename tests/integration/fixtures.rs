//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Writing temporary image manifests
//! - Fake container engines with scripted failure counts
//! - Pipeline configurations sized for tests

use std::path::PathBuf;

use tempfile::TempDir;

use kiln::config::Config;
use kiln::image::Manifest;

/// A temporary directory holding a manifest and any fake engines.
pub struct TestWorkspace {
    pub temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Write a manifest file and parse it.
    pub fn manifest(&self, toml: &str) -> Manifest {
        let path = self.path().join("images.toml");
        std::fs::write(&path, toml).expect("Failed to write manifest");
        Manifest::load(&path).expect("Failed to load manifest")
    }

    /// A fake engine that succeeds on every invocation.
    pub fn passing_engine(&self) -> String {
        "true".to_string()
    }

    /// A fake engine that fails on every invocation.
    pub fn failing_engine(&self) -> String {
        "false".to_string()
    }

    /// A fake engine that exits nonzero for its first `failures` invocations
    /// and succeeds afterwards, tracked through a counter file.
    #[cfg(unix)]
    pub fn flaky_engine(&self, failures: u32) -> String {
        use std::os::unix::fs::PermissionsExt;

        let counter = self.path().join("attempts");
        let script = self.path().join("flaky-engine");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 count=$(cat {counter} 2>/dev/null || echo 0)\n\
                 count=$((count + 1))\n\
                 echo $count > {counter}\n\
                 [ $count -gt {failures} ]\n",
                counter = counter.display(),
                failures = failures,
            ),
        )
        .expect("Failed to write fake engine");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to mark fake engine executable");
        script.display().to_string()
    }
}

/// Pipeline configuration sized for tests.
pub fn test_config(threads: usize, push_threads: usize, retries: u32, engine: &str) -> Config {
    Config {
        threads,
        push_threads,
        retries,
        engine: engine.to_string(),
        ..Config::default()
    }
}

/// A three-level manifest: base -> (nova, glance), nova -> api.
pub const DIAMOND_MANIFEST: &str = r#"
[[images]]
name = "base"
context = "."

[[images]]
name = "nova"
context = "."
parent = "base"

[[images]]
name = "glance"
context = "."
parent = "base"

[[images]]
name = "api"
context = "."
parent = "nova"
"#;
