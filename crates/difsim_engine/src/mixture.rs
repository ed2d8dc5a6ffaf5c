//! Two-population datasets.
//!
//! A mixture models a sample made of two disc sizes. Each population
//! contributes in proportion to its disc area, so for radii ratios `r`
//! (small) and `R` (big) and `N` records in total, the small population
//! supplies `round(N r² / (r² + R²))` records and the big one the rest.
//! Records are taken from the head of each source dataset, small first.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::codec;
use crate::error::{CodecError, ConfigError};

/// Record counts drawn from each population.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MixtureCounts {
    /// Records taken from the small-disc dataset.
    pub from_small: u64,
    /// Records taken from the big-disc dataset.
    pub from_big: u64,
}

impl MixtureCounts {
    /// Total number of records in the mixture.
    pub fn total(&self) -> u64 {
        self.from_small + self.from_big
    }
}

/// Splits `total` records between the two populations by disc area.
///
/// # Errors
///
/// Returns `ConfigError::InvalidSizeRatio` if either ratio is not finite
/// and strictly positive.
pub fn mixture_counts(
    total: u64,
    small_ratio: f64,
    big_ratio: f64,
) -> Result<MixtureCounts, ConfigError> {
    for ratio in [small_ratio, big_ratio] {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::InvalidSizeRatio(ratio));
        }
    }

    let small_area = small_ratio * small_ratio;
    let big_area = big_ratio * big_ratio;
    let from_small = (total as f64 * small_area / (small_area + big_area)).round() as u64;

    Ok(MixtureCounts {
        from_small,
        from_big: total - from_small,
    })
}

/// Output name for a mixture: the small dataset's stem followed by
/// `-{big_ratio}.bin`, in the small dataset's directory.
pub fn mixture_output_path(small: &Path, big_ratio: f64) -> PathBuf {
    let stem = small
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    small.with_file_name(format!("{}-{}.bin", stem, big_ratio))
}

/// Writes the mixture of `small` and `big` to `output`.
///
/// Returns the number of records written.
///
/// # Errors
///
/// - `CodecError::Truncated` if a source holds fewer records than needed
/// - `CodecError::Io` on any file system failure
pub fn compose_mixture(
    small: &Path,
    big: &Path,
    counts: MixtureCounts,
    output: &Path,
) -> Result<u64, CodecError> {
    let mut records = codec::read_head(small, counts.from_small)?;
    records.extend(codec::read_head(big, counts.from_big)?);

    let file = File::create(output)?;
    codec::write_records(&file, &records)?;
    file.sync_all()?;

    info!(
        output = %output.display(),
        from_small = counts.from_small,
        from_big = counts.from_big,
        "Mixture written"
    );
    Ok(records.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PhaseRecord;

    fn write(path: &Path, value: f64, n: usize) {
        let records = vec![
            PhaseRecord {
                phase_delta: value,
                phase_square: value,
                phase_sin: value,
            };
            n
        ];
        codec::write_records(File::create(path).unwrap(), &records).unwrap();
    }

    #[test]
    fn test_counts_follow_area() {
        let counts = mixture_counts(100_000, 0.5, 1.0).unwrap();
        assert_eq!(counts.from_small, 20_000);
        assert_eq!(counts.from_big, 80_000);

        let counts = mixture_counts(100_000, 1.0, 1.0).unwrap();
        assert_eq!(counts.from_small, 50_000);

        let counts = mixture_counts(100_000, 0.1, 1.0).unwrap();
        assert_eq!(counts.from_small, 990);
        assert_eq!(counts.total(), 100_000);
    }

    #[test]
    fn test_counts_reject_bad_ratio() {
        assert!(mixture_counts(10, 0.0, 1.0).is_err());
        assert!(mixture_counts(10, 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_output_name() {
        let path = mixture_output_path(Path::new("data/data_circle_100x10_0.3.bin"), 1.0);
        assert_eq!(path, Path::new("data/data_circle_100x10_0.3-1.bin"));
    }

    #[test]
    fn test_compose_takes_heads_small_first() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.bin");
        let big = dir.path().join("big.bin");
        let output = dir.path().join("mix.bin");
        write(&small, 1.0, 5);
        write(&big, 2.0, 5);

        let counts = MixtureCounts {
            from_small: 2,
            from_big: 3,
        };
        assert_eq!(compose_mixture(&small, &big, counts, &output).unwrap(), 5);

        let mixed = codec::read_records(File::open(&output).unwrap()).unwrap();
        let deltas: Vec<f64> = mixed.iter().map(|r| r.phase_delta).collect();
        assert_eq!(deltas, vec![1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_compose_short_source_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.bin");
        let big = dir.path().join("big.bin");
        write(&small, 1.0, 1);
        write(&big, 2.0, 5);

        let counts = MixtureCounts {
            from_small: 2,
            from_big: 1,
        };
        assert!(matches!(
            compose_mixture(&small, &big, counts, &dir.path().join("mix.bin")),
            Err(CodecError::Truncated {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_compose_huge_total_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.bin");
        let big = dir.path().join("big.bin");
        let output = dir.path().join("mix.bin");
        write(&small, 1.0, 2);
        write(&big, 2.0, 2);

        let counts = mixture_counts(u64::MAX / 2, 1.0, 1.0).unwrap();
        assert!(matches!(
            compose_mixture(&small, &big, counts, &output),
            Err(CodecError::Truncated { found: 2, .. })
        ));
        assert!(!output.exists());
    }
}
