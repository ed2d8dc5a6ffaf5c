//! Sample record store shared by all workers.
//!
//! The store owns one result slot per sample index plus the run state that
//! workers contend on: the per-slot claim bits, the claimed counter, the
//! shared cursor and the cancellation flag. All of it sits behind a single
//! mutex so that a claim is one check-and-set transition.
//!
//! Result slots are `OnceLock`s. Only the worker that won the claim for an
//! index writes its slot, once, outside the mutex.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::error::SimulationError;
use crate::record::PhaseRecord;

/// Outcome of an attempt to claim one index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the index and must compute it.
    Granted,
    /// Another worker already owns the index.
    Taken,
    /// Cancellation is set; no new work may start.
    Cancelled,
}

/// State guarded by the store mutex.
#[derive(Debug)]
struct RunState {
    calculated: Vec<bool>,
    claimed: usize,
    cursor: usize,
    cancelled: bool,
}

/// Fixed-size array of sample slots with claim bookkeeping.
#[derive(Debug)]
pub struct SampleStore {
    state: Mutex<RunState>,
    slots: Vec<OnceLock<PhaseRecord>>,
}

impl SampleStore {
    /// Creates a store with `num_samples` unclaimed slots.
    pub fn new(num_samples: usize) -> Self {
        Self {
            state: Mutex::new(RunState {
                calculated: vec![false; num_samples],
                claimed: 0,
                cursor: 0,
                cancelled: false,
            }),
            slots: (0..num_samples).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the store has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // The guarded data is plain flags and counters, every transition leaves
    // it consistent, so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tries to claim `index`.
    ///
    /// Marks the slot calculated and bumps the claimed counter in one
    /// exclusive section, before any numeric work happens.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn try_claim(&self, index: usize) -> Claim {
        let mut state = self.lock();
        if state.cancelled {
            return Claim::Cancelled;
        }
        if state.calculated[index] {
            return Claim::Taken;
        }
        state.calculated[index] = true;
        state.claimed += 1;
        Claim::Granted
    }

    /// Claims the next index from the shared cursor.
    ///
    /// Returns `None` once the range is exhausted or cancellation is set.
    /// Indices already claimed through [`SampleStore::try_claim`] are
    /// skipped.
    pub fn claim_next(&self) -> Option<usize> {
        let mut state = self.lock();
        if state.cancelled {
            return None;
        }
        while state.cursor < state.calculated.len() {
            let index = state.cursor;
            state.cursor += 1;
            if !state.calculated[index] {
                state.calculated[index] = true;
                state.claimed += 1;
                return Some(index);
            }
        }
        None
    }

    /// Stores the result of a granted claim.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::SlotAlreadyFilled` if the slot was written
    /// before.
    pub fn fill(&self, index: usize, record: PhaseRecord) -> Result<(), SimulationError> {
        self.slots[index]
            .set(record)
            .map_err(|_| SimulationError::SlotAlreadyFilled(index))
    }

    /// Number of granted claims so far. Never decreases.
    pub fn claimed(&self) -> usize {
        self.lock().claimed
    }

    /// Sets the cancellation flag. Claims already granted are unaffected.
    pub fn cancel(&self) {
        self.lock().cancelled = true;
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Returns `true` if `index` has been claimed.
    pub fn is_calculated(&self, index: usize) -> bool {
        self.lock().calculated[index]
    }

    /// Collects the records of every claimed slot, in index order.
    ///
    /// Call after all workers have joined.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::MissingRecord` for the first claimed slot
    /// that holds no result.
    pub fn calculated_records(&self) -> Result<Vec<PhaseRecord>, SimulationError> {
        let state = self.lock();
        let mut records = Vec::with_capacity(state.claimed);
        for (index, &calculated) in state.calculated.iter().enumerate() {
            if calculated {
                let record = self.slots[index]
                    .get()
                    .ok_or(SimulationError::MissingRecord(index))?;
                records.push(*record);
            }
        }
        Ok(records)
    }
}
