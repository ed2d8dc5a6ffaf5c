//! Tracing subscriber setup.
//!
//! Console output always; when a run log is given, a second layer appends
//! plain timestamped lines to it so the log survives across resumed runs.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;
use crate::error::{CliError, Result};

/// Installs the global subscriber.
///
/// `RUST_LOG` directives take precedence over `level`, which only sets the
/// default for targets they leave out.
pub fn init_tracing(level: LogLevel, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::io(path, e))?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
