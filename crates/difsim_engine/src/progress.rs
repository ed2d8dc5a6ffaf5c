//! Progress and cancellation interface for front ends.
//!
//! A [`ProgressHandle`] is the only coupling between the engine and
//! whatever displays progress: it exposes a monotonically increasing done
//! counter, the fixed total, and a cancellation input.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::store::SampleStore;

/// Cloneable view of a running simulation.
#[derive(Clone, Debug)]
pub struct ProgressHandle {
    store: Arc<SampleStore>,
}

impl ProgressHandle {
    pub(crate) fn new(store: Arc<SampleStore>) -> Self {
        Self { store }
    }

    /// Number of samples claimed so far.
    pub fn done(&self) -> usize {
        self.store.claimed()
    }

    /// Number of samples this run will produce if not cancelled.
    pub fn total(&self) -> usize {
        self.store.len()
    }

    /// Requests cooperative cancellation.
    ///
    /// Samples already being computed finish and are kept.
    pub fn cancel(&self) {
        self.store.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.store.is_cancelled()
    }

    /// Captures the counters together with the elapsed run time.
    pub fn snapshot(&self, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            done: self.done(),
            total: self.total(),
            elapsed,
        }
    }
}

/// Point-in-time progress with a linear completion estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSnapshot {
    /// Samples claimed.
    pub done: usize,
    /// Samples in the run.
    pub total: usize,
    /// Wall time since the run started.
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Completion in whole percent, rounded to nearest.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        (100.0 * self.done as f64 / self.total as f64).round() as u32
    }

    /// Estimated remaining time, extrapolated from the average rate so far.
    ///
    /// `None` until the first sample has been claimed.
    pub fn remaining(&self) -> Option<Duration> {
        if self.done == 0 {
            return None;
        }
        let left = self.total.saturating_sub(self.done) as f64;
        Some(Duration::from_secs_f64(
            left * self.elapsed.as_secs_f64() / self.done as f64,
        ))
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Done: {}%. Remaining: ", self.percent())?;
        match self.remaining() {
            Some(remaining) => write_remaining(f, remaining.as_secs_f64()),
            None => f.write_str("unknown."),
        }
    }
}

/// Coarse human wording: 5 s granularity under a minute, whole minutes
/// under an hour, hours and minutes under ten hours, whole hours above.
fn write_remaining(f: &mut fmt::Formatter<'_>, seconds: f64) -> fmt::Result {
    if seconds < 60.0 {
        let secs = 5 * (seconds / 5.0).ceil() as u64;
        return write!(f, "{} seconds.", secs);
    }
    if seconds < 3600.0 {
        return write!(f, "{} minutes.", (seconds / 60.0).ceil() as u64);
    }
    if seconds < 36_000.0 {
        let minutes = (seconds / 60.0).ceil() as u64;
        let (hours, minutes) = (minutes / 60, minutes % 60);
        if hours > 1 {
            write!(f, "{} hours", hours)?;
        } else {
            f.write_str("1 hour")?;
        }
        return match minutes {
            0 => f.write_str("."),
            1 => f.write_str(" and 1 minute."),
            m => write!(f, " and {} minutes.", m),
        };
    }
    write!(f, "{} hours.", (seconds / 3600.0).ceil() as u64)
}
