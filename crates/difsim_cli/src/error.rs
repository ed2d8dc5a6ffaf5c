//! Error types for the command-line front end.

use std::path::PathBuf;
use thiserror::Error;

use difsim_engine::EngineError;

/// Errors raised by the binaries before, during or after a run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid log level string.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    FileError(String),

    /// Environment variable held an unusable value.
    #[error("Environment variable {name}: {message}")]
    EnvError {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// Configuration values failed validation.
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// File system failure outside the engine.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Logging could not be installed.
    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    /// The blocking simulation task did not complete.
    #[error("Simulation task failed: {0}")]
    Join(String),

    /// A second interrupt stopped the run before anything was written.
    #[error("Run aborted by a second interrupt; {done} records computed by this run were not written")]
    Aborted {
        /// Records finished when the run was abandoned.
        done: usize,
    },

    /// Engine failure.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CliError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
