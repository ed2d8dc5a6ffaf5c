//! Simulation parameters.
//!
//! This module provides [`SimulationParams`], the immutable description of
//! one run, its validating builder, and the derived walk constants.

use crate::error::ConfigError;
use crate::walk::WalkParams;

/// Diffusion coefficient. Lengths are expressed in units of the free
/// diffusion length, so it is fixed at one.
pub const DIFFUSION_COEFF: f64 = 1.0;

/// Total diffusion time, fixed at one.
pub const DIFFUSION_TIME: f64 = 1.0;

/// How workers find the next sample to compute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClaimPolicy {
    /// Every worker scans the whole index range and claims whatever is
    /// still free.
    #[default]
    FullScan,

    /// Workers take the next index from one shared cursor.
    SharedCursor,
}

impl ClaimPolicy {
    /// Returns the kebab-case name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimPolicy::FullScan => "full-scan",
            ClaimPolicy::SharedCursor => "shared-cursor",
        }
    }
}

impl std::fmt::Display for ClaimPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-scan" | "scan" => Ok(ClaimPolicy::FullScan),
            "shared-cursor" | "cursor" => Ok(ClaimPolicy::SharedCursor),
            other => Err(ConfigError::InvalidParameter {
                name: "claim_policy",
                value: format!("unknown policy '{}'", other),
            }),
        }
    }
}

/// Parameters of one simulation run.
///
/// Immutable once built. Use [`SimulationParams::builder`] to construct
/// instances.
///
/// # Examples
///
/// ```rust
/// use difsim_engine::config::SimulationParams;
///
/// let params = SimulationParams::builder()
///     .num_samples(100)
///     .num_steps(1000)
///     .num_threads(4)
///     .size_ratio(1.0)
///     .build()
///     .expect("valid parameters");
///
/// assert!((params.radius() - 2f64.sqrt()).abs() < 1e-15);
/// assert_eq!(params.dt(), 1e-3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    num_samples: usize,
    num_steps: usize,
    num_threads: usize,
    size_ratio: f64,
}

impl SimulationParams {
    /// Creates a new parameter builder.
    #[inline]
    pub fn builder() -> SimulationParamsBuilder {
        SimulationParamsBuilder::default()
    }

    /// Number of samples to produce in this run.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of walk steps per sample.
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Number of worker threads.
    #[inline]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Disc radius relative to the free diffusion length.
    #[inline]
    pub fn size_ratio(&self) -> f64 {
        self.size_ratio
    }

    /// Disc radius: `size_ratio * sqrt(2 D T)`.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.size_ratio * (2.0 * DIFFUSION_COEFF * DIFFUSION_TIME).sqrt()
    }

    /// Time step: `T / num_steps`.
    #[inline]
    pub fn dt(&self) -> f64 {
        DIFFUSION_TIME / self.num_steps as f64
    }

    /// Standard deviation of one coordinate displacement: `sqrt(2 D dt)`.
    #[inline]
    pub fn step_stddev(&self) -> f64 {
        (2.0 * DIFFUSION_COEFF * self.dt()).sqrt()
    }

    /// Phase increment of the sine gradient per step: `2π / num_steps`.
    #[inline]
    pub fn angular_step(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.num_steps as f64
    }

    /// Walk constants derived from these parameters.
    pub fn walk_params(&self) -> WalkParams {
        WalkParams {
            radius: self.radius(),
            num_steps: self.num_steps,
            dt: self.dt(),
            step_stddev: self.step_stddev(),
            angular_step: self.angular_step(),
        }
    }

    /// Returns a copy producing `num_samples` samples instead.
    ///
    /// Used when resuming: the run only simulates what is still missing.
    pub fn with_num_samples(&self, num_samples: usize) -> Self {
        Self {
            num_samples,
            ..self.clone()
        }
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `num_steps` is 0
    /// - `num_threads` is 0
    /// - `size_ratio` is not finite or not strictly positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_steps == 0 {
            return Err(ConfigError::InvalidStepCount(self.num_steps));
        }
        if self.num_threads == 0 {
            return Err(ConfigError::InvalidThreadCount(self.num_threads));
        }
        if !self.size_ratio.is_finite() || self.size_ratio <= 0.0 {
            return Err(ConfigError::InvalidSizeRatio(self.size_ratio));
        }
        Ok(())
    }
}

/// Builder for [`SimulationParams`].
///
/// All four parameters are required; validation happens at build time.
#[derive(Clone, Debug, Default)]
pub struct SimulationParamsBuilder {
    num_samples: Option<usize>,
    num_steps: Option<usize>,
    num_threads: Option<usize>,
    size_ratio: Option<f64>,
}

impl SimulationParamsBuilder {
    /// Sets the number of samples (zero is allowed).
    #[inline]
    pub fn num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = Some(num_samples);
        self
    }

    /// Sets the number of walk steps per sample.
    #[inline]
    pub fn num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = Some(num_steps);
        self
    }

    /// Sets the number of worker threads.
    #[inline]
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Sets the disc size ratio.
    #[inline]
    pub fn size_ratio(mut self, size_ratio: f64) -> Self {
        self.size_ratio = Some(size_ratio);
        self
    }

    /// Builds the parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a parameter is missing or invalid.
    pub fn build(self) -> Result<SimulationParams, ConfigError> {
        let params = SimulationParams {
            num_samples: required("num_samples", self.num_samples)?,
            num_steps: required("num_steps", self.num_steps)?,
            num_threads: required("num_threads", self.num_threads)?,
            size_ratio: required("size_ratio", self.size_ratio)?,
        };

        params.validate()?;
        Ok(params)
    }
}

fn required<T>(name: &'static str, value: Option<T>) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::InvalidParameter {
        name,
        value: "must be specified".to_string(),
    })
}
