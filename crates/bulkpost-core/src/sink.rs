//! Concurrency-safe aggregation of one result per item.
//!
//! Many attempt drivers complete at once and record here; the coordinator
//! reads counts after every chunk and takes a full snapshot at the end (or
//! when a run aborts).

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::model::{ItemId, ProcessResult, Resolution};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("result for item {0} already recorded")]
    Duplicate(ItemId),
}

/// Running counts without cloning the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkCounts {
    pub succeeded: usize,
    pub terminal_failed: usize,
    pub exhausted: usize,
}

impl SinkCounts {
    pub fn failed(&self) -> usize {
        self.terminal_failed + self.exhausted
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed()
    }

    fn add<R>(&mut self, resolution: &Resolution<R>) {
        match resolution {
            Resolution::Success(_) => self.succeeded += 1,
            Resolution::TerminalFailure(_) => self.terminal_failed += 1,
            Resolution::Exhausted(_) => self.exhausted += 1,
        }
    }
}

/// Point-in-time copy of everything recorded, in completion order.
#[derive(Debug, Clone)]
pub struct ResultSnapshot<R> {
    pub results: Vec<ProcessResult<R>>,
    pub success_count: usize,
    pub failure_count: usize,
    pub terminal_count: usize,
    pub exhausted_count: usize,
}

impl<R> ResultSnapshot<R> {
    /// Failed results only (terminal and exhausted).
    pub fn failures(&self) -> impl Iterator<Item = &ProcessResult<R>> {
        self.results.iter().filter(|r| !r.success())
    }
}

struct SinkState<R> {
    results: Vec<ProcessResult<R>>,
    seen: HashSet<ItemId>,
    counts: SinkCounts,
}

/// Append-only result aggregator.
pub struct ResultSink<R> {
    state: Mutex<SinkState<R>>,
}

impl<R> Default for ResultSink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ResultSink<R> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SinkState {
                results: Vec::new(),
                seen: HashSet::new(),
                counts: SinkCounts::default(),
            }),
        }
    }

    // Every mutation below leaves the state consistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, SinkState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an item's result. Rejects a second result for the same id.
    pub fn record(&self, result: ProcessResult<R>) -> Result<(), SinkError> {
        let mut state = self.lock();
        if !state.seen.insert(result.item_id.clone()) {
            return Err(SinkError::Duplicate(result.item_id));
        }
        state.counts.add(&result.resolution);
        state.results.push(result);
        Ok(())
    }

    pub fn counts(&self) -> SinkCounts {
        self.lock().counts
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Clone> ResultSink<R> {
    pub fn snapshot(&self) -> ResultSnapshot<R> {
        let state = self.lock();
        ResultSnapshot {
            results: state.results.clone(),
            success_count: state.counts.succeeded,
            failure_count: state.counts.failed(),
            terminal_count: state.counts.terminal_failed,
            exhausted_count: state.counts.exhausted,
        }
    }
}
