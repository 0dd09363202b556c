//! Image manifest and the concrete build/push tasks.
//!
//! The manifest is the external collaborator of the scheduler: it decides
//! which images exist and how they depend on each other, then hands the
//! engine a set of root build tasks whose follow-ups encode the dependency
//! edges. An image's build task holds its children's build tasks and only
//! releases them (via `followups`) once its own build has succeeded; the
//! corresponding push task is routed to the push queue by the build task
//! itself as the final step of a successful run.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::core::{Task, WorkItem, WorkQueue};
use crate::log::Logger;
use crate::orchestration::TaskProducer;
use crate::{Error, Result};

/// One image entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSpec {
    pub name: String,
    /// Tag to build and push. Defaults to the image name.
    pub tag: Option<String>,
    /// Build context directory.
    pub context: PathBuf,
    /// Manifest name of the base image this one derives from.
    pub parent: Option<String>,
}

impl ImageSpec {
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }
}

/// The set of images to build, with their dependency edges.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub images: Vec<ImageSpec>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let manifest: Manifest = toml::from_str(&fs::read_to_string(path)?)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject duplicate names, unknown parents, and parent cycles.
    pub fn validate(&self) -> Result<()> {
        let mut by_name: HashMap<&str, &ImageSpec> = HashMap::new();
        for image in &self.images {
            if by_name.insert(image.name.as_str(), image).is_some() {
                return Err(Error::DuplicateImage(image.name.clone()));
            }
        }

        for image in &self.images {
            let mut seen = HashSet::new();
            let mut current = image;
            while let Some(parent) = &current.parent {
                if !seen.insert(parent.as_str()) {
                    return Err(Error::DependencyCycle(image.name.clone()));
                }
                current = by_name.get(parent.as_str()).copied().ok_or_else(|| Error::UnknownParent {
                    image: current.name.clone(),
                    parent: parent.clone(),
                })?;
            }
        }
        Ok(())
    }

    /// Images with no parent; the initial queue contents.
    pub fn roots(&self) -> Vec<&ImageSpec> {
        self.images.iter().filter(|i| i.parent.is_none()).collect()
    }

    /// Images directly derived from `name`.
    pub fn children_of(&self, name: &str) -> Vec<&ImageSpec> {
        self.images
            .iter()
            .filter(|i| i.parent.as_deref() == Some(name))
            .collect()
    }
}

/// Builds one image with the configured container engine.
pub struct BuildTask {
    spec: ImageSpec,
    engine: String,
    success: bool,
    children: Vec<Box<dyn Task>>,
    push_queue: Option<WorkQueue>,
    logger: Logger,
}

impl BuildTask {
    pub fn new(
        spec: ImageSpec,
        engine: String,
        children: Vec<Box<dyn Task>>,
        push_queue: Option<WorkQueue>,
        logger: &Logger,
    ) -> Self {
        let logger = logger.scoped(&spec.name);
        Self {
            spec,
            engine,
            success: false,
            children,
            push_queue,
            logger,
        }
    }
}

impl Task for BuildTask {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn run(&mut self) -> Result<()> {
        self.logger
            .info(&format!("Building {} from {}", self.spec.tag(), self.spec.context.display()));
        let output = Command::new(&self.engine)
            .arg("build")
            .arg("-t")
            .arg(self.spec.tag())
            .arg(&self.spec.context)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            self.logger.error(stderr.trim());
            return Err(Error::TaskFailed(format!(
                "build of {} exited with {}",
                self.spec.tag(),
                output.status
            )));
        }

        // The push unit rides the push queue; routing it is this task's
        // responsibility, never the queue's.
        if let Some(push_queue) = &self.push_queue {
            self.logger.info(&format!("Queued push of {}", self.spec.tag()));
            push_queue.put(WorkItem::Task(Box::new(PushTask::new(
                self.spec.clone(),
                self.engine.clone(),
                &self.logger,
            ))));
        }

        self.success = true;
        Ok(())
    }

    fn success(&self) -> bool {
        self.success
    }

    fn reset(&mut self) {
        self.success = false;
    }

    fn followups(&mut self) -> Vec<Box<dyn Task>> {
        std::mem::take(&mut self.children)
    }
}

/// Pushes one built image to its registry.
pub struct PushTask {
    spec: ImageSpec,
    label: String,
    engine: String,
    success: bool,
    logger: Logger,
}

impl PushTask {
    pub fn new(spec: ImageSpec, engine: String, logger: &Logger) -> Self {
        let logger = logger.scoped(&spec.name);
        let label = format!("push/{}", spec.name);
        Self {
            spec,
            label,
            engine,
            success: false,
            logger,
        }
    }
}

impl Task for PushTask {
    fn name(&self) -> &str {
        // Distinct from the build task's name so the status board reports
        // build and push outcomes separately.
        &self.label
    }

    fn run(&mut self) -> Result<()> {
        self.logger.info(&format!("Pushing {}", self.spec.tag()));
        let output = Command::new(&self.engine)
            .arg("push")
            .arg(self.spec.tag())
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            self.logger.error(stderr.trim());
            return Err(Error::TaskFailed(format!(
                "push of {} exited with {}",
                self.spec.tag(),
                output.status
            )));
        }
        self.success = true;
        Ok(())
    }

    fn success(&self) -> bool {
        self.success
    }

    fn reset(&mut self) {
        self.success = false;
    }
}

/// Turns a validated manifest into the initial build queue contents.
///
/// Only root (parentless) images are enqueued; every derived image is
/// reachable solely as a follow-up of its parent's task, so it can never
/// start before its base image has built.
pub struct ManifestProducer {
    manifest: Manifest,
    engine: String,
    push: bool,
    logger: Logger,
}

impl ManifestProducer {
    pub fn new(manifest: Manifest, engine: &str, push: bool, logger: Logger) -> Self {
        Self {
            manifest,
            engine: engine.to_string(),
            push,
            logger,
        }
    }

    fn task_for(&self, spec: &ImageSpec, push_queue: &WorkQueue) -> Box<dyn Task> {
        let children = self
            .manifest
            .children_of(&spec.name)
            .into_iter()
            .map(|child| self.task_for(child, push_queue))
            .collect();
        Box::new(BuildTask::new(
            spec.clone(),
            self.engine.clone(),
            children,
            self.push.then(|| push_queue.clone()),
            &self.logger,
        ))
    }
}

impl TaskProducer for ManifestProducer {
    fn populate(&mut self, build_queue: &WorkQueue, push_queue: &WorkQueue) -> Result<()> {
        for root in self.manifest.roots() {
            build_queue.put(WorkItem::Task(self.task_for(root, push_queue)));
        }
        Ok(())
    }
}
