//! Run configuration management.
//!
//! Handles loading [`RunConfig`] from a TOML file, environment variables and
//! command-line flags.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`DIFSIM_*`)
//! 3. Config file
//! 4. Default values

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

use difsim_engine::config::ClaimPolicy;

use crate::error::{CliError, Result};

/// Config file read when `--config` is not given, if present.
pub const DEFAULT_CONFIG_FILE: &str = "dif_circle.toml";

/// Environment variable overriding `data_dir`.
pub const ENV_DATA_DIR: &str = "DIFSIM_DATA_DIR";
/// Environment variable overriding `log_dir`.
pub const ENV_LOG_DIR: &str = "DIFSIM_LOG_DIR";
/// Environment variable overriding `log_level`.
pub const ENV_LOG_LEVEL: &str = "DIFSIM_LOG_LEVEL";
/// Environment variable overriding `progress_interval_secs`.
pub const ENV_PROGRESS_SECS: &str = "DIFSIM_PROGRESS_SECS";

/// Default verbosity of the console and run-log output.
///
/// Names are matched case-insensitively; `warning` is accepted for `warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Per-walk detail; very noisy on large runs.
    Trace,
    /// Per-worker completion counts.
    Debug,
    /// Run parameters, progress lines and the completion summary.
    #[default]
    Info,
    /// Resume anomalies, interrupts and count mismatches only.
    Warn,
    /// Fatal failures only.
    Error,
}

impl LogLevel {
    const NAMES: [(&'static str, LogLevel); 5] = [
        ("trace", LogLevel::Trace),
        ("debug", LogLevel::Debug),
        ("info", LogLevel::Info),
        ("warn", LogLevel::Warn),
        ("error", LogLevel::Error),
    ];

    /// Lowercase name, as written in config files and `RUST_LOG`.
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, level)| *level == self)
            .map_or("info", |&(name, _)| name)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = match s.trim().to_ascii_lowercase().as_str() {
            "warning" => "warn".to_string(),
            other => other.to_string(),
        };
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|&(_, level)| level)
            .ok_or_else(|| CliError::InvalidLogLevel(s.to_string()))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Front-end settings of a simulation run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding datasets and partial artifacts.
    pub data_dir: PathBuf,
    /// Directory holding run logs.
    pub log_dir: PathBuf,
    /// Default log filter, overridden by `RUST_LOG`.
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Seconds between progress lines.
    pub progress_interval_secs: u64,
    /// How workers claim sample indices.
    #[serde(deserialize_with = "deserialize_claim_policy")]
    pub claim_policy: ClaimPolicy,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> std::result::Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_claim_policy<'de, D>(deserializer: D) -> std::result::Result<ClaimPolicy, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ClaimPolicy::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_dir: PathBuf::from("logs"),
            log_level: LogLevel::Info,
            progress_interval_secs: 15,
            claim_policy: ClaimPolicy::FullScan,
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::FileError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| CliError::FileError(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Applies `DIFSIM_*` environment variables.
    pub fn with_env_override(self) -> Result<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(data_dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(data_dir);
        }

        if let Some(log_dir) = lookup(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(log_dir);
        }

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&log_level)?;
        }

        if let Some(secs) = lookup(ENV_PROGRESS_SECS) {
            self.progress_interval_secs = secs.trim().parse().map_err(|_| CliError::EnvError {
                name: ENV_PROGRESS_SECS,
                message: format!("'{}' is not a whole number of seconds", secs),
            })?;
        }

        Ok(self)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) {
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(log_dir) = &cli.log_dir {
            self.log_dir = log_dir.clone();
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        if let Some(secs) = cli.progress_interval_secs {
            self.progress_interval_secs = secs;
        }
        if let Some(policy) = cli.claim_policy {
            self.claim_policy = policy;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.data_dir.as_os_str().is_empty() {
            errors.push("data_dir cannot be empty".to_string());
        }
        if self.log_dir.as_os_str().is_empty() {
            errors.push("log_dir cannot be empty".to_string());
        }
        if self.progress_interval_secs == 0 {
            errors.push("progress_interval_secs must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CliError::Validation(errors))
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Data directory override
    pub data_dir: Option<PathBuf>,
    /// Log directory override
    pub log_dir: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<LogLevel>,
    /// Progress interval override
    pub progress_interval_secs: Option<u64>,
    /// Claim policy override
    pub claim_policy: Option<ClaimPolicy>,
}

/// Build configuration from all sources.
///
/// An explicit `--config` file must exist; the default file is read only
/// when present.
pub fn build_config(cli: &CliOverrides) -> Result<RunConfig> {
    let config = match &cli.config_file {
        Some(path) => RunConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            RunConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => RunConfig::default(),
    };

    let mut config = config.with_env_override()?;
    config.merge_with_cli(cli);
    config.validate()?;

    Ok(config)
}
