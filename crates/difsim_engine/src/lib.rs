//! # Diffusion Simulation Engine
//!
//! difsim_engine samples restricted diffusion inside a disc for NMR-style
//! phase statistics. Each sample is an independent Gaussian random walk,
//! reflected at the wall by rejection, that accumulates three phases under
//! different gradient waveforms.
//!
//! ## Architecture
//!
//! - [`rng`]: bit-exact MT19937 with polar Box-Muller Gaussians
//! - [`walk`]: one walk, producing a [`PhaseRecord`]
//! - [`store`]: result slots plus the mutex-guarded claim state
//! - [`dispatcher`]: fixed worker pool claiming indices from the store
//! - [`progress`]: done counter and cancellation for front ends
//! - [`checkpoint`]: artifact naming, resume planning and promotion
//! - [`codec`]: 24-byte little-endian record serialization
//! - [`mixture`]: two-population datasets composed from existing ones
//!
//! ## Usage Example
//!
//! ```rust
//! use difsim_engine::config::SimulationParams;
//! use difsim_engine::dispatcher::{Dispatcher, SeedSource};
//!
//! let params = SimulationParams::builder()
//!     .num_samples(16)
//!     .num_steps(100)
//!     .num_threads(4)
//!     .size_ratio(0.5)
//!     .build()
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(params.clone()).with_seed_source(SeedSource::Fixed(vec![7]));
//! let progress = dispatcher.progress();
//!
//! let outcome = dispatcher.run().unwrap();
//! assert_eq!(progress.done(), 16);
//! assert!(outcome
//!     .records
//!     .iter()
//!     .all(|r| r.phase_square.abs() <= params.radius()));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod checkpoint;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mixture;
pub mod progress;
pub mod record;
pub mod rng;
pub mod store;
pub mod walk;

pub use config::{ClaimPolicy, SimulationParams};
pub use dispatcher::{Dispatcher, RunOutcome, SeedSource};
pub use error::{EngineError, EngineResult};
pub use progress::{ProgressHandle, ProgressSnapshot};
pub use record::{PhaseRecord, RECORD_SIZE};
