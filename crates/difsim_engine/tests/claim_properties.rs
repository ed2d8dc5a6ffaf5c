//! Claim protocol properties under real thread pools.
//!
//! Every test drives the public dispatcher with a kernel that records which
//! index it computed, so duplicate or lost claims show up in the output.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use difsim_engine::config::{ClaimPolicy, SimulationParams};
use difsim_engine::dispatcher::{Dispatcher, SampleKernel, SeedSource};
use difsim_engine::rng::MersenneTwister;
use difsim_engine::PhaseRecord;
use proptest::prelude::*;

fn params(samples: usize, threads: usize) -> SimulationParams {
    SimulationParams::builder()
        .num_samples(samples)
        .num_steps(1)
        .num_threads(threads)
        .size_ratio(1.0)
        .build()
        .unwrap()
}

/// Logs every computed index and echoes it back as the record.
#[derive(Default)]
struct LoggingKernel {
    seen: Mutex<Vec<usize>>,
}

impl SampleKernel for LoggingKernel {
    fn compute(&self, rng: &mut MersenneTwister, index: usize) -> PhaseRecord {
        // Some generator work so claims interleave
        for _ in 0..16 {
            rng.next_u32();
        }
        self.seen.lock().unwrap().push(index);
        PhaseRecord {
            phase_delta: index as f64,
            ..PhaseRecord::default()
        }
    }
}

fn policy_strategy() -> impl Strategy<Value = ClaimPolicy> {
    prop_oneof![Just(ClaimPolicy::FullScan), Just(ClaimPolicy::SharedCursor)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_each_index_computed_exactly_once(
        samples in 0usize..400,
        threads in 1usize..9,
        policy in policy_strategy(),
    ) {
        let dispatcher = Dispatcher::with_kernel(params(samples, threads), LoggingKernel::default())
            .with_claim_policy(policy)
            .with_seed_source(SeedSource::Fixed(vec![samples as u32]));
        let outcome = dispatcher.run().unwrap();

        prop_assert_eq!(outcome.claimed, samples);
        prop_assert_eq!(outcome.records.len(), samples);
        for (i, record) in outcome.records.iter().enumerate() {
            prop_assert_eq!(record.phase_delta, i as f64);
        }
        prop_assert_eq!(outcome.per_worker.iter().sum::<usize>(), samples);
    }
}

/// Cancels once `after` computations have started.
struct CancelAfter {
    after: usize,
    started: AtomicUsize,
    cancel: Mutex<Option<difsim_engine::ProgressHandle>>,
    seen: Mutex<Vec<usize>>,
}

impl SampleKernel for CancelAfter {
    fn compute(&self, _rng: &mut MersenneTwister, index: usize) -> PhaseRecord {
        if self.started.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
            if let Some(handle) = self.cancel.lock().unwrap().as_ref() {
                handle.cancel();
            }
        }
        self.seen.lock().unwrap().push(index);
        PhaseRecord::default()
    }
}

#[test]
fn test_cancellation_bounds_and_no_duplicates() {
    for policy in [ClaimPolicy::FullScan, ClaimPolicy::SharedCursor] {
        let kernel = CancelAfter {
            after: 25,
            started: AtomicUsize::new(0),
            cancel: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
        };
        let dispatcher = Dispatcher::with_kernel(params(2000, 4), kernel).with_claim_policy(policy);
        let progress = dispatcher.progress();
        *dispatcher.kernel().cancel.lock().unwrap() = Some(dispatcher.progress());

        let outcome = dispatcher.run().unwrap();

        assert!(outcome.cancelled);
        assert!(outcome.claimed >= 25 && outcome.claimed <= 2000);
        assert_eq!(outcome.records.len(), outcome.claimed);
        assert_eq!(progress.done(), outcome.claimed);

        let mut seen = dispatcher.kernel().seen.lock().unwrap().clone();
        assert_eq!(seen.len(), outcome.claimed);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), outcome.claimed);
    }
}
