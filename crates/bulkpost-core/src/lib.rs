//! bulkpost core: push a large stream of independent JSON payloads at one
//! HTTP endpoint with a fixed ceiling on in-flight requests, exponential
//! backoff on transient failures, and per-item result aggregation.
//!
//! Layers, leaves first: [`retry`] (classification and backoff), [`sink`]
//! (result aggregation), [`dispatcher`] (concurrency ceiling and per-item
//! attempt loop), [`batch`] (memory-bounded chunking and progress).

pub mod batch;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod logging;
pub mod model;
pub mod retry;
pub mod sink;
pub mod store;
pub mod transport;

pub use batch::{BatchCoordinator, BatchError, ChunkProgress, CompletionReport, JsonLinesSource};
pub use codec::{Codec, JsonCodec, RawJsonCodec};
pub use dispatcher::{DispatchConfig, DispatchError, Dispatcher, Submission, WorkerPool};
pub use model::{ItemId, ProcessResult, Resolution, WorkItem};
pub use retry::{ItemError, Outcome, RetryPolicy};
pub use sink::{ResultSink, ResultSnapshot};
pub use store::{NullStore, ResultDb, ResultStore};
pub use transport::{CurlTransport, HttpRequest, HttpResponse, RequestTemplate, Transport};
