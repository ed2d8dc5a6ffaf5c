//! Work dispatcher: a fixed pool of workers claiming sample indices.
//!
//! Every worker owns a private generator and loops
//! `Scanning → Claiming → Computing → Scanning` until its pass over the
//! index range is complete:
//!
//! - **Claiming** is one exclusive section on the [`SampleStore`]: the slot
//!   is marked calculated and the counter bumped before any numeric work,
//!   so an index is computed at most once whatever the thread count.
//! - **Computing** runs outside the lock and touches only the worker's
//!   generator, its stack, and the slot it just won.
//! - **Cancellation** stops new claims. Walks already claimed run to
//!   completion and their results are kept.
//!
//! A panic or non-finite result inside a worker cancels the remaining
//! claims and is reported as one aggregated [`SimulationError`] once every
//! worker has returned.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{ClaimPolicy, SimulationParams};
use crate::error::{SimulationError, WorkerFault};
use crate::progress::ProgressHandle;
use crate::record::PhaseRecord;
use crate::rng::MersenneTwister;
use crate::store::{Claim, SampleStore};
use crate::walk::{self, WalkParams};

/// Computes one sample from a worker's private generator.
///
/// Implementations must be pure functions of the generator stream; the
/// index is provided for diagnostics only.
pub trait SampleKernel: Sync {
    /// Produces the record for sample `index`.
    fn compute(&self, rng: &mut MersenneTwister, index: usize) -> PhaseRecord;
}

impl SampleKernel for WalkParams {
    #[inline]
    fn compute(&self, rng: &mut MersenneTwister, _index: usize) -> PhaseRecord {
        walk::compute_sample(rng, self)
    }
}

/// Where worker generators get their seeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SeedSource {
    /// Operating system entropy, one fresh key per worker.
    #[default]
    Entropy,

    /// Fixed key; worker `k` is seeded with the key followed by `k`.
    Fixed(Vec<u32>),
}

impl SeedSource {
    fn generator(&self, worker: usize) -> Result<MersenneTwister, WorkerFault> {
        match self {
            SeedSource::Entropy => {
                MersenneTwister::from_entropy().map_err(|e| WorkerFault::Entropy {
                    worker,
                    message: e.to_string(),
                })
            }
            SeedSource::Fixed(key) => {
                let mut key = key.clone();
                key.push(worker as u32);
                Ok(MersenneTwister::from_seed_array(&key))
            }
        }
    }
}

/// Result of a completed (or cancelled) run.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Records of every claimed sample, in index order.
    pub records: Vec<PhaseRecord>,
    /// Number of granted claims.
    pub claimed: usize,
    /// Whether cancellation was requested during the run.
    pub cancelled: bool,
    /// Wall time from pool start to join.
    pub elapsed: Duration,
    /// Samples computed by each worker.
    pub per_worker: Vec<usize>,
}

/// What one worker did.
#[derive(Debug)]
struct WorkerReport {
    computed: usize,
    fault: Option<WorkerFault>,
}

/// Runs a fixed pool of workers over one [`SampleStore`].
///
/// # Examples
///
/// ```rust
/// use difsim_engine::config::SimulationParams;
/// use difsim_engine::dispatcher::{Dispatcher, SeedSource};
///
/// let params = SimulationParams::builder()
///     .num_samples(8)
///     .num_steps(10)
///     .num_threads(2)
///     .size_ratio(1.0)
///     .build()
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(params).with_seed_source(SeedSource::Fixed(vec![1, 2]));
/// let outcome = dispatcher.run().unwrap();
/// assert_eq!(outcome.records.len(), 8);
/// assert!(!outcome.cancelled);
/// ```
pub struct Dispatcher<K: SampleKernel = WalkParams> {
    params: SimulationParams,
    kernel: K,
    policy: ClaimPolicy,
    seeds: SeedSource,
    store: Arc<SampleStore>,
}

impl Dispatcher<WalkParams> {
    /// Creates a dispatcher running disc walks for `params`.
    pub fn new(params: SimulationParams) -> Self {
        let kernel = params.walk_params();
        Self::with_kernel(params, kernel)
    }
}

impl<K: SampleKernel> Dispatcher<K> {
    /// Creates a dispatcher running a custom kernel.
    pub fn with_kernel(params: SimulationParams, kernel: K) -> Self {
        let store = Arc::new(SampleStore::new(params.num_samples()));
        Self {
            params,
            kernel,
            policy: ClaimPolicy::default(),
            seeds: SeedSource::default(),
            store,
        }
    }

    /// Sets how workers find work.
    pub fn with_claim_policy(mut self, policy: ClaimPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how worker generators are seeded.
    pub fn with_seed_source(mut self, seeds: SeedSource) -> Self {
        self.seeds = seeds;
        self
    }

    /// Parameters of this run.
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// The kernel computing each sample.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Progress counter and cancellation input for front ends.
    pub fn progress(&self) -> ProgressHandle {
        ProgressHandle::new(Arc::clone(&self.store))
    }

    /// Runs all workers to completion and collects the records.
    ///
    /// Blocks until every worker has returned.
    ///
    /// # Errors
    ///
    /// - `SimulationError::Pool` if the threads cannot be spawned
    /// - `SimulationError::WorkerFaults` if any worker failed
    /// - `SimulationError::MissingRecord` if a claimed slot stayed empty
    pub fn run(&self) -> Result<RunOutcome, SimulationError> {
        let num_threads = self.params.num_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("difsim-worker-{}", i))
            .build()?;

        info!(
            num_samples = self.params.num_samples(),
            num_steps = self.params.num_steps(),
            num_threads,
            policy = %self.policy,
            "Starting random walks"
        );

        let start = Instant::now();
        let reports = pool.broadcast(|ctx| self.worker_loop(ctx.index()));
        let elapsed = start.elapsed();

        let per_worker: Vec<usize> = reports.iter().map(|r| r.computed).collect();
        let faults: Vec<WorkerFault> = reports.into_iter().filter_map(|r| r.fault).collect();
        if let Some(err) = SimulationError::from_faults(faults) {
            warn!(error = %err, "Workers failed, run aborted");
            return Err(err);
        }

        let records = self.store.calculated_records()?;
        let claimed = self.store.claimed();
        let cancelled = self.store.is_cancelled();

        info!(
            claimed,
            cancelled,
            elapsed_secs = elapsed.as_secs_f64(),
            "Random walks finished"
        );

        Ok(RunOutcome {
            records,
            claimed,
            cancelled,
            elapsed,
            per_worker,
        })
    }

    fn worker_loop(&self, worker: usize) -> WorkerReport {
        let mut rng = match self.seeds.generator(worker) {
            Ok(rng) => rng,
            Err(fault) => {
                self.store.cancel();
                return WorkerReport {
                    computed: 0,
                    fault: Some(fault),
                };
            }
        };

        let mut computed = 0;
        let mut fault = None;

        match self.policy {
            ClaimPolicy::FullScan => {
                for index in 0..self.store.len() {
                    match self.store.try_claim(index) {
                        Claim::Granted => {}
                        Claim::Taken => continue,
                        Claim::Cancelled => break,
                    }
                    if let Err(f) = self.compute(&mut rng, worker, index) {
                        fault = Some(f);
                        break;
                    }
                    computed += 1;
                }
            }
            ClaimPolicy::SharedCursor => {
                while let Some(index) = self.store.claim_next() {
                    if let Err(f) = self.compute(&mut rng, worker, index) {
                        fault = Some(f);
                        break;
                    }
                    computed += 1;
                }
            }
        }

        if fault.is_some() {
            self.store.cancel();
        }
        debug!(worker, computed, "Worker finished");

        WorkerReport { computed, fault }
    }

    fn compute(
        &self,
        rng: &mut MersenneTwister,
        worker: usize,
        index: usize,
    ) -> Result<(), WorkerFault> {
        let record = panic::catch_unwind(AssertUnwindSafe(|| self.kernel.compute(rng, index)))
            .map_err(|payload| WorkerFault::Panicked {
                worker,
                index,
                message: panic_message(payload.as_ref()),
            })?;

        if !record.is_finite() {
            return Err(WorkerFault::NonFinite { worker, index });
        }

        self.store
            .fill(index, record)
            .map_err(|_| WorkerFault::SlotConflict { worker, index })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
