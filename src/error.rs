use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate image in manifest: {0}")]
    DuplicateImage(String),

    #[error("Image {image} references unknown parent {parent}")]
    UnknownParent { image: String, parent: String },

    #[error("Dependency cycle involving image {0}")]
    DependencyCycle(String),

    #[error("Container engine not found: {0}")]
    EngineNotFound(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Interrupted by user")]
    Interrupted,

    #[error("Worker join error: {0}")]
    WorkerJoin(String),

    #[error("No home directory")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, Error>;
