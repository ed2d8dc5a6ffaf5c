//! Command-line front end for difsim.
//!
//! Shared by the `dif_circle` (simulation) and `dif_mix` (two-population
//! mixture) binaries.

pub mod config;
pub mod error;
pub mod logging;
pub mod run;

pub use error::{CliError, Result};
