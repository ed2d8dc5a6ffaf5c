//! dif_mix: compose a two-population dataset from a small-disc and a
//! big-disc dataset.
//!
//! Each population contributes in proportion to its disc area. The output
//! defaults to the small dataset's name with `-{big_ratio}` appended.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use difsim_cli::config::LogLevel;
use difsim_cli::logging;
use difsim_engine::mixture;

/// Mix two phase datasets by disc area
#[derive(Parser, Debug)]
#[command(name = "dif_mix")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of records in the mixture
    total: u64,

    /// Small-disc dataset
    small: PathBuf,

    /// Size ratio of the small disc
    small_ratio: f64,

    /// Big-disc dataset
    big: PathBuf,

    /// Size ratio of the big disc
    big_ratio: f64,

    /// Output file [default: <small stem>-<big_ratio>.bin]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: LogLevel,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.log_level, None)?;

    let counts = mixture::mixture_counts(args.total, args.small_ratio, args.big_ratio)
        .context("Invalid size ratio")?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| mixture::mixture_output_path(&args.small, args.big_ratio));

    info!(
        small = %args.small.display(),
        big = %args.big.display(),
        from_small = counts.from_small,
        from_big = counts.from_big,
        "Composing mixture"
    );

    let written = mixture::compose_mixture(&args.small, &args.big, counts, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(output = %output.display(), records = written, "Done");
    Ok(())
}
