//! Progress and completion reporting for batch runs.
//!
//! The coordinator sends one `ChunkProgress` per resolved chunk; consumers can
//! compute throughput as completed / elapsed.

use std::time::Duration;

use crate::sink::SinkCounts;

/// Snapshot emitted after each chunk fully resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkProgress {
    /// 1-based index of the chunk that just resolved.
    pub chunk_index: usize,
    /// Items in that chunk.
    pub chunk_len: usize,
    /// Items resolved so far in this run.
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl ChunkProgress {
    /// Items resolved per second (0 if elapsed is 0).
    pub fn items_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / secs
    }
}

/// Final aggregate of a completed run.
///
/// Outcome counts mirror what the dispatcher's result sink accepted, so they
/// agree with `ResultSink::snapshot`. An item whose id was already recorded
/// is counted in `duplicates` only; `submitted` includes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub terminal_failed: usize,
    pub exhausted: usize,
    /// Resolved items the sink rejected as duplicate ids.
    pub duplicates: usize,
    pub chunks: usize,
    /// Chunks whose results the store failed to persist.
    pub unpersisted_chunks: usize,
    pub elapsed: Duration,
}

impl CompletionReport {
    pub fn failed(&self) -> usize {
        self.terminal_failed + self.exhausted
    }

    pub fn completed(&self) -> usize {
        self.succeeded + self.failed()
    }

    /// Add one chunk: `before`/`after` are sink counts around the chunk and
    /// `resolved` is how many results its submissions delivered.
    pub(super) fn absorb(&mut self, before: SinkCounts, after: SinkCounts, resolved: usize) {
        let succeeded = after.succeeded.saturating_sub(before.succeeded);
        let terminal = after.terminal_failed.saturating_sub(before.terminal_failed);
        let exhausted = after.exhausted.saturating_sub(before.exhausted);
        self.succeeded += succeeded;
        self.terminal_failed += terminal;
        self.exhausted += exhausted;
        self.duplicates += resolved.saturating_sub(succeeded + terminal + exhausted);
    }
}
