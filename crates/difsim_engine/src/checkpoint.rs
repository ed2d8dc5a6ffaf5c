//! Checkpoint/resume manager for dataset artifacts.
//!
//! A run writes to a partial artifact (`.tmp`) and renames it to the final
//! name only once the requested number of records is present. Resume is
//! count-based: the partial's record count is subtracted from the request
//! and the new records are appended.
//!
//! # Example
//!
//! ```rust,ignore
//! let paths = ArtifactPaths::new("data", "logs", &params);
//! let plan = checkpoint::inspect(&paths, params.num_samples() as u64)?;
//! let outcome = Dispatcher::new(params.with_num_samples(plan.remaining as usize)).run()?;
//! let report = checkpoint::finalize(&paths, &plan, &outcome.records, outcome.cancelled)?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec;
use crate::config::SimulationParams;
use crate::error::CheckpointError;
use crate::record::PhaseRecord;

/// Result type for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Locations of the artifacts of one parameter set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Final dataset.
    pub output: PathBuf,
    /// Partial dataset accumulating across interrupted runs.
    pub partial: PathBuf,
    /// Append-only run log.
    pub log: PathBuf,
}

impl ArtifactPaths {
    /// Derives artifact names from the requested parameters.
    ///
    /// `data_circle_{samples}x{steps}_{ratio}.bin` in `data_dir`, the same
    /// with `.tmp` for the partial, and `run_circle_...log` in `log_dir`.
    pub fn new(
        data_dir: impl AsRef<Path>,
        log_dir: impl AsRef<Path>,
        params: &SimulationParams,
    ) -> Self {
        let stem = artifact_stem(params);
        let data_dir = data_dir.as_ref();
        Self {
            output: data_dir.join(format!("data_circle_{}.bin", stem)),
            partial: data_dir.join(format!("data_circle_{}.tmp", stem)),
            log: log_dir.as_ref().join(format!("run_circle_{}.log", stem)),
        }
    }

    /// Returns `true` if the final dataset already exists.
    pub fn is_complete(&self) -> bool {
        self.output.is_file()
    }
}

/// `{samples}x{steps}_{ratio}`, with the ratio in shortest round-trip form.
fn artifact_stem(params: &SimulationParams) -> String {
    format!(
        "{}x{}_{}",
        params.num_samples(),
        params.num_steps(),
        params.size_ratio()
    )
}

/// What a run must still produce, decided from the partial artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResumePlan {
    /// Records requested for the dataset.
    pub requested: u64,
    /// Records already in the partial artifact.
    pub previously_written: u64,
    /// Records this run must simulate.
    pub remaining: u64,
    /// Whether new records are appended to an existing partial.
    pub resuming: bool,
}

impl ResumePlan {
    /// Plan for a run with no usable partial.
    pub fn fresh(requested: u64) -> Self {
        Self {
            requested,
            previously_written: 0,
            remaining: requested,
            resuming: false,
        }
    }
}

/// Inspects the partial artifact and decides how much is left to do.
///
/// A partial whose size is not a whole number of records is ignored and
/// will be overwritten.
///
/// # Errors
///
/// - `CheckpointError::Io` if the partial cannot be inspected
/// - `CheckpointError::PartialExceedsTarget` if it holds more than `requested`
pub fn inspect(paths: &ArtifactPaths, requested: u64) -> CheckpointResult<ResumePlan> {
    let len = match fs::metadata(&paths.partial) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ResumePlan::fresh(requested)),
        Err(e) => return Err(CheckpointError::io(&paths.partial, e)),
    };

    let Some(written) = codec::record_count(len) else {
        warn!(
            path = %paths.partial.display(),
            bytes = len,
            "Partial artifact is not a whole number of records, starting over"
        );
        return Ok(ResumePlan::fresh(requested));
    };

    if written > requested {
        return Err(CheckpointError::PartialExceedsTarget {
            path: paths.partial.clone(),
            written,
            requested,
        });
    }

    info!(
        path = %paths.partial.display(),
        previously_written = written,
        remaining = requested - written,
        "Resuming from partial artifact"
    );

    Ok(ResumePlan {
        requested,
        previously_written: written,
        remaining: requested - written,
        resuming: true,
    })
}

/// What [`finalize`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Records written by this run.
    pub written: u64,
    /// Records in the artifact after writing.
    pub total: u64,
    /// Bytes written by this run.
    pub bytes: u64,
    /// Whether the partial was renamed to the final name.
    pub promoted: bool,
    /// Where the records now live.
    pub path: PathBuf,
}

/// Persists this run's records and promotes the partial when appropriate.
///
/// Records are appended when `plan.resuming`, otherwise the partial is
/// created or truncated. The partial is renamed to the final name only if
/// the run was not cancelled.
///
/// # Errors
///
/// Returns `CheckpointError` on any file system failure; nothing is
/// promoted in that case.
pub fn finalize(
    paths: &ArtifactPaths,
    plan: &ResumePlan,
    records: &[PhaseRecord],
    cancelled: bool,
) -> CheckpointResult<FinalizeReport> {
    let file = open_partial(&paths.partial, plan.resuming)
        .map_err(|e| CheckpointError::io(&paths.partial, e))?;
    let bytes = codec::write_records(&file, records)?;
    file.sync_all()
        .map_err(|e| CheckpointError::io(&paths.partial, e))?;

    let written = records.len() as u64;
    let total = if plan.resuming {
        plan.previously_written + written
    } else {
        written
    };

    info!(
        path = %paths.partial.display(),
        written,
        total,
        bytes,
        "Records written"
    );

    if cancelled {
        info!(path = %paths.partial.display(), "Run cancelled, partial artifact kept");
        return Ok(FinalizeReport {
            written,
            total,
            bytes,
            promoted: false,
            path: paths.partial.clone(),
        });
    }

    fs::rename(&paths.partial, &paths.output)
        .map_err(|e| CheckpointError::io(&paths.output, e))?;
    info!(path = %paths.output.display(), total, "Dataset promoted");

    Ok(FinalizeReport {
        written,
        total,
        bytes,
        promoted: true,
        path: paths.output.clone(),
    })
}

fn open_partial(path: &Path, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    if append {
        options.append(true).create(true);
    } else {
        options.write(true).create(true).truncate(true);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn params(samples: usize, ratio: f64) -> SimulationParams {
        SimulationParams::builder()
            .num_samples(samples)
            .num_steps(1000)
            .num_threads(1)
            .size_ratio(ratio)
            .build()
            .unwrap()
    }

    fn records(n: usize) -> Vec<PhaseRecord> {
        (0..n)
            .map(|i| PhaseRecord {
                phase_delta: i as f64,
                ..PhaseRecord::default()
            })
            .collect()
    }

    fn setup(samples: usize) -> (TempDir, ArtifactPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path(), dir.path(), &params(samples, 1.0));
        (dir, paths)
    }

    #[test]
    fn test_artifact_names() {
        let paths = ArtifactPaths::new("data", "logs", &params(100, 1.0));
        assert_eq!(paths.output, Path::new("data/data_circle_100x1000_1.bin"));
        assert_eq!(paths.partial, Path::new("data/data_circle_100x1000_1.tmp"));
        assert_eq!(paths.log, Path::new("logs/run_circle_100x1000_1.log"));

        let paths = ArtifactPaths::new("d", "l", &params(5, 0.25));
        assert_eq!(paths.output, Path::new("d/data_circle_5x1000_0.25.bin"));
    }

    #[test]
    fn test_inspect_without_partial() {
        let (_dir, paths) = setup(10);
        assert_eq!(inspect(&paths, 10).unwrap(), ResumePlan::fresh(10));
    }

    #[test]
    fn test_inspect_counts_existing_records() {
        let (_dir, paths) = setup(10);
        codec::write_records(File::create(&paths.partial).unwrap(), &records(4)).unwrap();

        let plan = inspect(&paths, 10).unwrap();
        assert_eq!(plan.previously_written, 4);
        assert_eq!(plan.remaining, 6);
        assert!(plan.resuming);
    }

    #[test]
    fn test_inspect_ignores_misaligned_partial() {
        let (_dir, paths) = setup(10);
        fs::write(&paths.partial, [0u8; 30]).unwrap();

        let plan = inspect(&paths, 10).unwrap();
        assert_eq!(plan, ResumePlan::fresh(10));

        let report = finalize(&paths, &plan, &records(10), false).unwrap();
        assert_eq!(report.total, 10);
        assert_eq!(fs::metadata(&paths.output).unwrap().len(), 240);
    }

    #[test]
    fn test_inspect_rejects_oversized_partial() {
        let (_dir, paths) = setup(2);
        codec::write_records(File::create(&paths.partial).unwrap(), &records(3)).unwrap();

        assert!(matches!(
            inspect(&paths, 2),
            Err(CheckpointError::PartialExceedsTarget {
                written: 3,
                requested: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_resume_appends_and_promotes() {
        let (_dir, paths) = setup(10);
        codec::write_records(File::create(&paths.partial).unwrap(), &records(4)).unwrap();

        let plan = inspect(&paths, 10).unwrap();
        let report = finalize(&paths, &plan, &records(6), false).unwrap();

        assert!(report.promoted);
        assert_eq!(report.written, 6);
        assert_eq!(report.total, 10);
        assert!(!paths.partial.exists());
        assert!(paths.is_complete());

        let stored = codec::read_records(File::open(&paths.output).unwrap()).unwrap();
        let deltas: Vec<f64> = stored.iter().map(|r| r.phase_delta).collect();
        assert_eq!(deltas, vec![0., 1., 2., 3., 0., 1., 2., 3., 4., 5.]);
    }

    #[test]
    fn test_cancelled_run_keeps_partial() {
        let (_dir, paths) = setup(10);
        let plan = inspect(&paths, 10).unwrap();

        let report = finalize(&paths, &plan, &records(3), true).unwrap();
        assert!(!report.promoted);
        assert_eq!(report.path, paths.partial);
        assert!(!paths.is_complete());
        assert_eq!(fs::metadata(&paths.partial).unwrap().len(), 72);

        // Next run picks up where this one stopped
        let plan = inspect(&paths, 10).unwrap();
        assert_eq!(plan.remaining, 7);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let paths = ArtifactPaths::new("/nonexistent/difsim", "/nonexistent/difsim", &params(1, 1.0));
        let plan = ResumePlan::fresh(1);
        assert!(matches!(
            finalize(&paths, &plan, &records(1), false),
            Err(CheckpointError::Io { .. })
        ));
    }
}
