//! Per-sample phase record.

/// Size of one serialized record in bytes: three little-endian `f64`.
pub const RECORD_SIZE: usize = 24;

/// Phases accumulated along one random walk.
///
/// Each field is the phase picked up under one gradient shape:
/// - `phase_delta`: narrow pulses at both ends (net displacement)
/// - `phase_square`: square-wave gradient, sign flips half-way
/// - `phase_sin`: one full sine period over the diffusion time
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseRecord {
    /// Initial minus final x coordinate.
    pub phase_delta: f64,
    /// Square-wave weighted integral of x, scaled by `dt`.
    pub phase_square: f64,
    /// Sine weighted integral of x, scaled by `dt`.
    pub phase_sin: f64,
}

impl PhaseRecord {
    /// Returns `true` if all three phases are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.phase_delta.is_finite() && self.phase_square.is_finite() && self.phase_sin.is_finite()
    }

    /// Encodes the record as `(phase_delta, phase_square, phase_sin)`.
    pub fn to_le_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..8].copy_from_slice(&self.phase_delta.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.phase_square.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.phase_sin.to_le_bytes());
        bytes
    }

    /// Decodes a record written by [`PhaseRecord::to_le_bytes`].
    pub fn from_le_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let field = |offset: usize| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[offset..offset + 8]);
            f64::from_le_bytes(word)
        };

        Self {
            phase_delta: field(0),
            phase_square: field(8),
            phase_sin: field(16),
        }
    }
}
