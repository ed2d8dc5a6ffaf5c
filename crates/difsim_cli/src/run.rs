//! Orchestration of one simulation run.
//!
//! The engine runs on a blocking thread. The async side logs progress on a
//! fixed interval and turns Ctrl-C into a cancellation request, then hands
//! the collected records to the checkpoint manager. A second Ctrl-C
//! abandons the run without touching the partial.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use difsim_engine::checkpoint::{self, ArtifactPaths, FinalizeReport};
use difsim_engine::config::{DIFFUSION_COEFF, DIFFUSION_TIME};
use difsim_engine::dispatcher::{Dispatcher, SeedSource};
use difsim_engine::{EngineError, SimulationParams};

use crate::config::RunConfig;
use crate::error::{CliError, Result};

/// How a run ended.
#[derive(Debug)]
pub enum RunSummary {
    /// The final dataset already existed; nothing was simulated.
    Skipped {
        /// Existing dataset.
        output: PathBuf,
    },

    /// Records were simulated and persisted.
    Completed {
        /// Samples computed by this run.
        computed: usize,
        /// Whether the run was interrupted.
        cancelled: bool,
        /// Wall time of the simulation.
        elapsed: Duration,
        /// What was written and where.
        report: FinalizeReport,
    },
}

/// Response to a Ctrl-C during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Stop claiming, keep finished records.
    Cancel,
    /// Give up immediately, writing nothing.
    Abort,
}

/// Counts interrupts received by one run.
#[derive(Debug, Default)]
pub struct Interrupts {
    received: u32,
}

impl Interrupts {
    /// Records one interrupt and returns what it should do.
    pub fn record(&mut self) -> InterruptAction {
        self.received = self.received.saturating_add(1);
        if self.received == 1 {
            InterruptAction::Cancel
        } else {
            InterruptAction::Abort
        }
    }

    /// Interrupts seen so far.
    pub fn received(&self) -> u32 {
        self.received
    }
}

/// Derives artifact paths and creates the data and log directories.
pub fn prepare(config: &RunConfig, params: &SimulationParams) -> Result<ArtifactPaths> {
    for dir in [&config.data_dir, &config.log_dir] {
        std::fs::create_dir_all(dir).map_err(|e| CliError::io(dir, e))?;
    }
    Ok(ArtifactPaths::new(&config.data_dir, &config.log_dir, params))
}

/// Runs the simulation for `params` and persists the result.
pub async fn execute(
    params: &SimulationParams,
    config: &RunConfig,
    paths: &ArtifactPaths,
    seeds: SeedSource,
) -> Result<RunSummary> {
    if paths.is_complete() {
        info!(output = %paths.output.display(), "Dataset already exists, skipping run");
        return Ok(RunSummary::Skipped {
            output: paths.output.clone(),
        });
    }

    info!(
        num_samples = params.num_samples(),
        num_steps = params.num_steps(),
        num_threads = params.num_threads(),
        size_ratio = params.size_ratio(),
        claim_policy = %config.claim_policy,
        "Run parameters"
    );
    info!(
        diffusion_coeff = DIFFUSION_COEFF,
        diffusion_time = DIFFUSION_TIME,
        radius = params.radius(),
        dt = params.dt(),
        step_stddev = params.step_stddev(),
        "Physical constants"
    );

    let plan =
        checkpoint::inspect(paths, params.num_samples() as u64).map_err(EngineError::from)?;
    let remaining = usize::try_from(plan.remaining).map_err(|_| {
        CliError::Validation(vec![format!(
            "{} remaining samples exceed the addressable range",
            plan.remaining
        )])
    })?;

    let dispatcher = Dispatcher::new(params.with_num_samples(remaining))
        .with_claim_policy(config.claim_policy)
        .with_seed_source(seeds);
    let progress = dispatcher.progress();

    let start = Instant::now();
    let mut task = tokio::task::spawn_blocking(move || dispatcher.run());

    let mut ticker = tokio::time::interval(Duration::from_secs(config.progress_interval_secs));
    ticker.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut signals = true;
    let mut interrupts = Interrupts::default();

    let outcome = loop {
        tokio::select! {
            joined = &mut task => {
                let result = joined.map_err(|e| CliError::Join(e.to_string()))?;
                break result.map_err(EngineError::from)?;
            }
            _ = ticker.tick() => {
                info!("{}", progress.snapshot(start.elapsed()));
            }
            signal = &mut ctrl_c, if signals => {
                match signal.map(|()| interrupts.record()) {
                    Err(e) => {
                        warn!(error = %e, "Ctrl-C handler unavailable");
                        signals = false;
                    }
                    Ok(InterruptAction::Cancel) => {
                        warn!("Interrupt received, finishing walks already claimed. Press Ctrl-C again to quit without saving");
                        progress.cancel();
                        // Resolved futures cannot be polled again
                        ctrl_c.set(tokio::signal::ctrl_c());
                    }
                    Ok(InterruptAction::Abort) => {
                        warn!(
                            done = progress.done(),
                            partial = %paths.partial.display(),
                            "Second interrupt, quitting. Records of this run are not written to the partial"
                        );
                        return Err(CliError::Aborted { done: progress.done() });
                    }
                }
            }
        }
    };

    let report = checkpoint::finalize(paths, &plan, &outcome.records, outcome.cancelled)
        .map_err(EngineError::from)?;

    info!(
        "Done {} samples in {}. Written {}",
        outcome.claimed,
        format_elapsed(outcome.elapsed),
        report.written
    );
    if report.written != outcome.claimed as u64 {
        warn!(
            computed = outcome.claimed,
            written = report.written,
            "Computed and written counts differ"
        );
    }
    if report.promoted {
        info!(output = %report.path.display(), records = report.total, "Dataset complete");
    } else {
        info!(
            partial = %report.path.display(),
            records = report.total,
            remaining = plan.requested - report.total,
            "Run interrupted, rerun with the same parameters to resume"
        );
    }

    Ok(RunSummary::Completed {
        computed: outcome.claimed,
        cancelled: outcome.cancelled,
        elapsed: outcome.elapsed,
        report,
    })
}

/// `HH:MM:SS` wall time.
pub fn format_elapsed(elapsed: Duration) -> String {
    match chrono::Duration::from_std(elapsed) {
        Ok(elapsed) => format!(
            "{:02}:{:02}:{:02}",
            elapsed.num_hours(),
            elapsed.num_minutes() % 60,
            elapsed.num_seconds() % 60
        ),
        Err(_) => format!("{}s", elapsed.as_secs()),
    }
}
