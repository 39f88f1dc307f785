// src/errors.rs

//! Crate-wide error type, result alias and the process exit-code convention.

use thiserror::Error;

/// Attempts that exit with this code are never re-invoked by the supervisor.
pub const EXIT_DISALLOW_RETRY: i32 = 202;

/// Attempts that exit with this code are re-invoked (with `attempt + 1`)
/// while retry budget remains.
pub const EXIT_ALLOW_RETRY: i32 = 203;

#[derive(Error, Debug)]
pub enum StepJobError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown step: {0}")]
    StepNotFound(String),

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Datastore error: {0}")]
    Datastore(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StepJobError>;
