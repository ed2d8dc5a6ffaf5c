//! dif_circle: random walks in a disc, written as a binary phase dataset.
//!
//! ```text
//! dif_circle <NUM_SAMPLES> <NUM_STEPS> <NUM_THREADS> <SIZE_RATIO> [OPTIONS]
//! ```
//!
//! Produces `data_circle_{samples}x{steps}_{ratio}.bin` in the data
//! directory. An interrupted run (Ctrl-C) keeps its records in the `.tmp`
//! partial; rerunning with the same parameters resumes from there.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use difsim_cli::config::{build_config, CliOverrides, LogLevel};
use difsim_cli::{logging, run};
use difsim_engine::config::ClaimPolicy;
use difsim_engine::dispatcher::SeedSource;
use difsim_engine::SimulationParams;

/// Monte Carlo sampler for restricted diffusion in a disc
#[derive(Parser, Debug)]
#[command(name = "dif_circle")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of samples (random walks) to produce
    num_samples: usize,

    /// Number of steps per walk
    num_steps: usize,

    /// Number of worker threads
    num_threads: usize,

    /// Disc radius relative to the free diffusion length
    size_ratio: f64,

    /// Configuration file path (TOML format) [default: dif_circle.toml if present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for datasets
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for run logs
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Seconds between progress lines
    #[arg(long, value_name = "SECS")]
    progress_secs: Option<u64>,

    /// Claim policy (full-scan, shared-cursor)
    #[arg(long)]
    claim_policy: Option<ClaimPolicy>,
}

impl From<&Args> for CliOverrides {
    fn from(args: &Args) -> Self {
        CliOverrides {
            config_file: args.config.clone(),
            data_dir: args.data_dir.clone(),
            log_dir: args.log_dir.clone(),
            log_level: args.log_level,
            progress_interval_secs: args.progress_secs,
            claim_policy: args.claim_policy,
        }
    }
}

impl Args {
    fn simulation_params(&self) -> anyhow::Result<SimulationParams> {
        SimulationParams::builder()
            .num_samples(self.num_samples)
            .num_steps(self.num_steps)
            .num_threads(self.num_threads)
            .size_ratio(self.size_ratio)
            .build()
            .context("Invalid simulation parameters")
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let params = args.simulation_params()?;
    let config = build_config(&CliOverrides::from(&args)).context("Invalid configuration")?;

    let paths = run::prepare(&config, &params)?;
    logging::init_tracing(config.log_level, Some(&paths.log))?;

    tracing::info!("dif_circle v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let result = runtime.block_on(run::execute(&params, &config, &paths, SeedSource::Entropy));
    // An aborted run leaves workers on the blocking pool; don't wait for them
    runtime.shutdown_background();

    if let Err(e) = result {
        error!(error = %e, "Run failed");
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("dif_circle").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_invalid_params_rejected_before_runtime() {
        let args = parse(&["100", "1000", "0", "1.0"]);
        let err = args.simulation_params().unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid thread count 0"));
        assert!(tokio::runtime::Handle::try_current().is_err());
    }

    #[test]
    fn test_args_into_params_and_overrides() {
        let args = parse(&["100", "1000", "4", "0.5", "--log-level", "debug"]);
        let params = args.simulation_params().unwrap();
        assert_eq!(params.num_samples(), 100);
        assert_eq!(params.num_threads(), 4);

        let overrides = CliOverrides::from(&args);
        assert_eq!(overrides.log_level, Some(LogLevel::Debug));
        assert!(overrides.config_file.is_none());
    }

    #[test]
    fn test_missing_positional_is_a_usage_error() {
        assert!(Args::try_parse_from(["dif_circle", "100", "1000"]).is_err());
    }
}
