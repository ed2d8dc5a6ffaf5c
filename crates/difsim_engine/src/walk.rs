//! Random walk of one particle inside a disc.
//!
//! A sample starts at a uniformly distributed point of the disc and takes
//! `num_steps` Gaussian steps. Proposals that leave the disc are redrawn
//! from the same point, which realises the reflecting wall by rejection.
//! Along the way three phases are accumulated (see [`PhaseRecord`]).
//!
//! Both rejection loops are unbounded. The initial placement accepts with
//! probability π/4; a step proposal is rejected only when the particle sits
//! within a few `step_stddev` of the wall, so acceptance is at least about
//! one half.

use crate::record::PhaseRecord;
use crate::rng::{MersenneTwister, UNIT_SPAN};

/// Constants of one walk, derived from the simulation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkParams {
    /// Disc radius.
    pub radius: f64,
    /// Number of steps.
    pub num_steps: usize,
    /// Time step.
    pub dt: f64,
    /// Standard deviation of each coordinate displacement.
    pub step_stddev: f64,
    /// Sine gradient phase increment per step.
    pub angular_step: f64,
}

/// Receives every accepted position of a walk.
///
/// `step` is 0 for the initial placement and `k + 1` for the position
/// accepted at the end of step `k`.
pub trait WalkObserver {
    /// Called once per accepted position.
    fn observe(&mut self, step: usize, x: f64, y: f64);
}

/// Observer that ignores every position.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl WalkObserver for NoopObserver {
    #[inline]
    fn observe(&mut self, _step: usize, _x: f64, _y: f64) {}
}

/// Streaming extent of a trajectory: number of positions and the largest
/// squared distance from the centre.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtentObserver {
    count: usize,
    max_radius_sq: f64,
}

impl ExtentObserver {
    /// Creates an empty observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions observed.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Largest `x² + y²` observed.
    pub fn max_radius_sq(&self) -> f64 {
        self.max_radius_sq
    }
}

impl WalkObserver for ExtentObserver {
    #[inline]
    fn observe(&mut self, _step: usize, x: f64, y: f64) {
        self.count += 1;
        self.max_radius_sq = self.max_radius_sq.max(x * x + y * y);
    }
}

/// Simulates one walk and returns its phases.
///
/// The result depends only on the generator stream and `params`.
#[inline]
pub fn compute_sample(rng: &mut MersenneTwister, params: &WalkParams) -> PhaseRecord {
    simulate_walk(rng, params, &mut NoopObserver)
}

/// Simulates one walk, reporting every accepted position to `observer`.
pub fn simulate_walk<O: WalkObserver + ?Sized>(
    rng: &mut MersenneTwister,
    params: &WalkParams,
    observer: &mut O,
) -> PhaseRecord {
    let radius = params.radius;
    let radius_sq = radius * radius;
    let scale = 2.0 * radius / UNIT_SPAN;

    // Uniform point of the bounding square, kept if inside the disc.
    let (mut x, mut y) = loop {
        let x = scale * f64::from(rng.next_u32()) - radius;
        let y = scale * f64::from(rng.next_u32()) - radius;
        if x * x + y * y <= radius_sq {
            break (x, y);
        }
    };
    observer.observe(0, x, y);

    let half = params.num_steps / 2;
    let mut phase_delta = x;
    let mut phase_square = 0.0;
    let mut phase_sin = 0.0;

    for step in 0..params.num_steps {
        if step < half {
            phase_square += x;
        } else {
            phase_square -= x;
        }
        phase_sin += x * (params.angular_step * step as f64).sin();

        let (x_next, y_next) = loop {
            let x_next = x + params.step_stddev * rng.next_gaussian();
            let y_next = y + params.step_stddev * rng.next_gaussian();
            if x_next * x_next + y_next * y_next <= radius_sq {
                break (x_next, y_next);
            }
        };

        x = x_next;
        y = y_next;
        observer.observe(step + 1, x, y);
    }

    phase_delta -= x;

    PhaseRecord {
        phase_delta,
        phase_square: phase_square * params.dt,
        phase_sin: phase_sin * params.dt,
    }
}
