//! Error types for the random-walk engine.
//!
//! This module defines structured error types for parameter validation,
//! record serialization, checkpoint handling and worker faults.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error for simulation parameters.
///
/// These errors occur during construction when invalid parameters are
/// provided, before any worker thread starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Step count must be positive.
    #[error("Invalid step count {0}: must be at least 1")]
    InvalidStepCount(usize),

    /// Thread count must be positive.
    #[error("Invalid thread count {0}: must be at least 1")]
    InvalidThreadCount(usize),

    /// Size ratio must be finite and strictly positive.
    #[error("Invalid size ratio {0}: must be finite and positive")]
    InvalidSizeRatio(f64),

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

/// Errors raised while encoding or decoding sample records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input ended inside a record.
    #[error("Trailing {trailing} byte(s) after the last complete record")]
    TrailingBytes {
        /// Number of bytes past the last full record.
        trailing: usize,
    },

    /// Fewer records were available than requested.
    #[error("Expected {expected} record(s), found only {found}")]
    Truncated {
        /// Records requested.
        expected: u64,
        /// Records actually present.
        found: u64,
    },
}

/// Errors raised by the checkpoint/resume manager.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// File system operation failed on an artifact.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Artifact involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Record serialization failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The partial artifact already holds more records than requested.
    #[error(
        "Partial artifact {} holds {written} record(s), more than the {requested} requested",
        path.display()
    )]
    PartialExceedsTarget {
        /// Partial artifact path.
        path: PathBuf,
        /// Records already present.
        written: u64,
        /// Records requested for the dataset.
        requested: u64,
    },
}

impl CheckpointError {
    /// Wraps an I/O error with the artifact path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A fault raised inside one worker thread.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WorkerFault {
    /// The worker could not seed its generator.
    #[error("worker {worker}: entropy source failed: {message}")]
    Entropy {
        /// Worker index within the pool.
        worker: usize,
        /// Error text from the entropy source.
        message: String,
    },

    /// The walk computation panicked.
    #[error("worker {worker}: sample {index} panicked: {message}")]
    Panicked {
        /// Worker index within the pool.
        worker: usize,
        /// Sample index being computed.
        index: usize,
        /// Panic payload text.
        message: String,
    },

    /// The walk produced a NaN or infinite phase.
    #[error("worker {worker}: sample {index} produced a non-finite phase")]
    NonFinite {
        /// Worker index within the pool.
        worker: usize,
        /// Sample index being computed.
        index: usize,
    },

    /// The result slot of a granted claim was already filled.
    #[error("worker {worker}: sample {index} was already stored")]
    SlotConflict {
        /// Worker index within the pool.
        worker: usize,
        /// Sample index being stored.
        index: usize,
    },
}

/// Runtime errors of the work dispatcher.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// One or more workers failed; remaining claims were cancelled.
    #[error("{count} worker fault(s), first: {first}")]
    WorkerFaults {
        /// Number of faults reported.
        count: usize,
        /// First fault in worker order.
        first: WorkerFault,
        /// Every fault, in worker order.
        all: Vec<WorkerFault>,
    },

    /// A result slot was filled twice.
    #[error("Sample slot {0} written more than once")]
    SlotAlreadyFilled(usize),

    /// A claimed slot has no result after all workers joined.
    #[error("Sample slot {0} was claimed but never filled")]
    MissingRecord(usize),
}

impl SimulationError {
    /// Aggregates worker faults into a single error.
    ///
    /// Returns `None` when `faults` is empty.
    pub fn from_faults(faults: Vec<WorkerFault>) -> Option<Self> {
        let first = faults.first()?.clone();
        Some(Self::WorkerFaults {
            count: faults.len(),
            first,
            all: faults,
        })
    }
}

/// Umbrella error for a complete engine run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid parameters.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker or store failure.
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    /// Artifact handling failure.
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
