//! Chunked batch coordinator.
//!
//! Pulls items from a work source `chunk_size` at a time, submits the chunk to
//! the dispatcher and waits for every item of it before pulling the next one,
//! so at most `chunk_size` items are unresolved at any moment regardless of
//! the dispatcher's concurrency ceiling. After each chunk the results are
//! persisted (once per chunk) and a `ChunkProgress` is sent to the observer.
//!
//! Item failures are recorded and never stop the run. Only a dispatcher
//! infrastructure failure aborts; the error carries what was resolved so far.
//!
//! Report counts are read from the dispatcher's sink around each chunk, so a
//! run expects to be the dispatcher's only submitter while it is going.

mod progress;
mod source;

use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::codec::Codec;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::model::WorkItem;
use crate::sink::ResultSnapshot;
use crate::store::{NullStore, ResultStore};
use crate::transport::Transport;

pub use progress::{ChunkProgress, CompletionReport};
pub use source::JsonLinesSource;

static NULL_STORE: NullStore = NullStore;

#[derive(Debug, Error)]
pub enum BatchError<R> {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// The run stopped; `partial` holds every result recorded before it did.
    #[error("fatal infrastructure error: {source}")]
    FatalInfrastructure {
        #[source]
        source: DispatchError,
        partial: ResultSnapshot<R>,
    },
}

pub struct BatchCoordinator<'a, T: Transport, C: Codec, S = NullStore> {
    dispatcher: &'a Dispatcher<T, C>,
    store: &'a S,
    progress: Option<mpsc::Sender<ChunkProgress>>,
}

impl<'a, T: Transport, C: Codec> BatchCoordinator<'a, T, C, NullStore> {
    pub fn new(dispatcher: &'a Dispatcher<T, C>) -> Self {
        Self {
            dispatcher,
            store: &NULL_STORE,
            progress: None,
        }
    }
}

impl<'a, T, C, S> BatchCoordinator<'a, T, C, S>
where
    T: Transport,
    C: Codec,
    S: ResultStore<C::Response>,
{
    /// Persist each chunk's results to `store`.
    pub fn with_store<S2: ResultStore<C::Response>>(
        self,
        store: &'a S2,
    ) -> BatchCoordinator<'a, T, C, S2> {
        BatchCoordinator {
            dispatcher: self.dispatcher,
            store,
            progress: self.progress,
        }
    }

    /// Send a `ChunkProgress` to `tx` after every chunk.
    pub fn with_progress(mut self, tx: mpsc::Sender<ChunkProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Process the whole source chunk by chunk.
    pub async fn run<I>(
        &self,
        source: I,
        chunk_size: usize,
    ) -> Result<CompletionReport, BatchError<C::Response>>
    where
        I: IntoIterator<Item = WorkItem<C::Payload>>,
    {
        if chunk_size == 0 {
            return Err(BatchError::InvalidChunkSize);
        }
        let started = Instant::now();
        let mut items = source.into_iter();
        let mut report = CompletionReport::default();

        loop {
            let chunk: Vec<_> = items.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let chunk_index = report.chunks + 1;
            let chunk_len = chunk.len();
            tracing::debug!(chunk = chunk_index, items = chunk_len, "chunk submitted");

            let before = self.dispatcher.sink().counts();
            let mut fatal: Option<DispatchError> = None;
            let mut pending = Vec::with_capacity(chunk_len);
            for item in chunk {
                match self.dispatcher.submit(item) {
                    Ok(submission) => pending.push(submission),
                    Err(e) => {
                        fatal = Some(e);
                        break;
                    }
                }
            }
            report.submitted += pending.len();

            let mut results = Vec::with_capacity(pending.len());
            for submission in pending {
                match submission.await {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        tracing::error!(chunk = chunk_index, error = %e, "item lost to infrastructure failure");
                        if fatal.is_none() {
                            fatal = Some(e);
                        }
                    }
                }
            }
            report.absorb(before, self.dispatcher.sink().counts(), results.len());

            if !results.is_empty() {
                if let Err(e) = self.store.upsert(&results).await {
                    tracing::warn!(chunk = chunk_index, error = %e, "persisting chunk results failed");
                    report.unpersisted_chunks += 1;
                }
            }

            if let Some(source) = fatal {
                tracing::error!(
                    chunk = chunk_index,
                    completed = report.completed(),
                    error = %source,
                    "batch run aborted"
                );
                return Err(BatchError::FatalInfrastructure {
                    source,
                    partial: self.dispatcher.sink().snapshot(),
                });
            }

            report.chunks = chunk_index;
            let progress = ChunkProgress {
                chunk_index,
                chunk_len,
                completed: report.completed(),
                succeeded: report.succeeded,
                failed: report.failed(),
                elapsed: started.elapsed(),
            };
            tracing::info!(
                chunk = chunk_index,
                completed = progress.completed,
                succeeded = progress.succeeded,
                failed = progress.failed,
                "chunk complete"
            );
            if let Some(tx) = &self.progress {
                let _ = tx.send(progress).await;
            }
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            submitted = report.submitted,
            succeeded = report.succeeded,
            terminal_failed = report.terminal_failed,
            exhausted = report.exhausted,
            duplicates = report.duplicates,
            chunks = report.chunks,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch run complete"
        );
        Ok(report)
    }
}
