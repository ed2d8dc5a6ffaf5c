//! MT19937 pseudo-random number generator.
//!
//! This module provides [`MersenneTwister`], a 32-bit Mersenne Twister with
//! array seeding, tempering and a polar Box-Muller Gaussian sampler.
//!
//! # Algorithm Reference
//!
//! M. Matsumoto and T. Nishimura, "Mersenne Twister: A 623-Dimensionally
//! Equidistributed Uniform Pseudo-Random Number Generator", ACM Transactions
//! on Modeling and Computer Simulation, Vol. 8, No. 1, January 1998, pp 3-30.

use rand::rngs::OsRng;
use rand::RngCore;

/// Length of the internal state vector in 32-bit words.
pub const STATE_SIZE: usize = 624;

/// Offset of the middle word used by the twist recurrence.
const MIDDLE_WORD: usize = 397;

/// Twist matrix constant applied when the low bit of the mixed word is set.
const MATRIX_A: u32 = 0x9908_b0df;

const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

const TEMPERING_MASK_B: u32 = 0x9d2c_5680;
const TEMPERING_MASK_C: u32 = 0xefc6_0000;

/// Largest raw draw as a float (`2^32 - 1`).
///
/// Multiplying a draw by `2 / UNIT_SPAN` maps it onto the closed interval
/// `[0, 2]`, which is how the walk and the Gaussian sampler build symmetric
/// uniforms.
pub const UNIT_SPAN: f64 = 4_294_967_295.0;

/// Scale from a raw draw to the half-open unit interval (`1 / 2^32`).
const REAL2_SCALE: f64 = 1.0 / 4_294_967_296.0;

/// MT19937 generator with a cached second Gaussian variate.
///
/// Not safe for concurrent use: every worker thread owns its own instance.
///
/// # Examples
///
/// ```rust
/// use difsim_engine::rng::MersenneTwister;
///
/// let mut a = MersenneTwister::from_seed_array(&[1, 2, 3]);
/// let mut b = MersenneTwister::from_seed_array(&[1, 2, 3]);
/// assert_eq!(a.next_u32(), b.next_u32());
/// ```
#[derive(Clone)]
pub struct MersenneTwister {
    /// Internal state vector.
    state: Box<[u32; STATE_SIZE]>,
    /// Number of words of the current block already consumed.
    index: usize,
    /// Second value of the last accepted Box-Muller pair.
    cached_gaussian: Option<f64>,
}

impl MersenneTwister {
    /// Creates a generator seeded with `key` via `init_by_array`.
    ///
    /// Keys of any length are accepted. An empty key seeds like `[0]`.
    pub fn from_seed_array(key: &[u32]) -> Self {
        let mut rng = Self {
            state: Box::new([0; STATE_SIZE]),
            index: STATE_SIZE,
            cached_gaussian: None,
        };
        rng.reseed(key);
        rng
    }

    /// Creates a generator seeded from the operating system entropy source.
    ///
    /// One 624-word key is collected per instance, each word assembled
    /// little-endian from four bytes.
    ///
    /// # Errors
    ///
    /// Returns the entropy source error if the operating system cannot
    /// provide random bytes.
    pub fn from_entropy() -> Result<Self, rand::Error> {
        let mut bytes = [0u8; STATE_SIZE * 4];
        OsRng.try_fill_bytes(&mut bytes)?;

        let key: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self::from_seed_array(&key))
    }

    /// Re-initialises the state from `key` and drops any cached Gaussian.
    pub fn reseed(&mut self, key: &[u32]) {
        let key = if key.is_empty() { &[0u32][..] } else { key };
        let mt = &mut self.state;

        mt[0] = 19_650_218;
        for i in 1..STATE_SIZE {
            let prev = mt[i - 1];
            mt[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }

        let mut i = 1;
        let mut j = 0;
        for _ in 0..STATE_SIZE.max(key.len()) {
            let prev = mt[i - 1];
            mt[i] = (mt[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_664_525))
                .wrapping_add(key[j])
                .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= STATE_SIZE {
                mt[0] = mt[STATE_SIZE - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }

        for _ in 0..STATE_SIZE - 1 {
            let prev = mt[i - 1];
            mt[i] = (mt[i] ^ (prev ^ (prev >> 30)).wrapping_mul(1_566_083_941))
                .wrapping_sub(i as u32);
            i += 1;
            if i >= STATE_SIZE {
                mt[0] = mt[STATE_SIZE - 1];
                i = 1;
            }
        }

        // MSB set: the initial array is never all zero
        mt[0] = UPPER_MASK;

        self.cached_gaussian = None;
        self.reload();
    }

    /// Returns the next tempered 32-bit output, uniform over `u32`.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        if self.index == STATE_SIZE {
            self.reload();
        }

        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & TEMPERING_MASK_B;
        y ^= (y << 15) & TEMPERING_MASK_C;
        y ^ (y >> 18)
    }

    /// Returns the next draw divided by `2^32`, uniform in `[0, 1)`.
    #[inline]
    pub fn next_real2(&mut self) -> f64 {
        f64::from(self.next_u32()) * REAL2_SCALE
    }

    /// Returns a standard normal variate (mean 0, standard deviation 1).
    ///
    /// Polar Box-Muller: each accepted trial yields two values. The `y`
    /// branch is returned immediately and the `x` branch is cached for the
    /// following call, which then consumes no draws.
    ///
    /// The rejection loop accepts with probability π/4 per trial and has no
    /// iteration cap.
    pub fn next_gaussian(&mut self) -> f64 {
        if let Some(cached) = self.cached_gaussian.take() {
            return cached;
        }

        let scale = 2.0 / UNIT_SPAN;
        let (x, y, r) = loop {
            let x = scale * f64::from(self.next_u32()) - 1.0;
            let y = scale * f64::from(self.next_u32()) - 1.0;
            let r = x * x + y * y;
            if r < 1.0 && r != 0.0 {
                break (x, y, r);
            }
        };

        let z = (-2.0 * r.ln() / r).sqrt();
        self.cached_gaussian = Some(x * z);
        y * z
    }

    /// Returns `true` if a Gaussian variate is waiting in the cache.
    #[inline]
    pub fn has_cached_gaussian(&self) -> bool {
        self.cached_gaussian.is_some()
    }

    /// Regenerates the whole state block.
    fn reload(&mut self) {
        let mt = &mut self.state;
        for i in 0..STATE_SIZE {
            let y = (mt[i] & UPPER_MASK) | (mt[(i + 1) % STATE_SIZE] & LOWER_MASK);
            let mag = if y & 1 == 0 { 0 } else { MATRIX_A };
            mt[i] = mt[(i + MIDDLE_WORD) % STATE_SIZE] ^ (y >> 1) ^ mag;
        }
        self.index = 0;
    }
}

impl std::fmt::Debug for MersenneTwister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MersenneTwister")
            .field("index", &self.index)
            .field("cached_gaussian", &self.cached_gaussian)
            .finish_non_exhaustive()
    }
}

impl RngCore for MersenneTwister {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        MersenneTwister::next_u32(self)
    }

    /// Two consecutive draws, the first one in the high word.
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(MersenneTwister::next_u32(self));
        let lo = u64::from(MersenneTwister::next_u32(self));
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = MersenneTwister::next_u32(self).to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
