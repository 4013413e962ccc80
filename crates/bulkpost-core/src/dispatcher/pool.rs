//! Owned worker pool: a dedicated multi-thread runtime.
//!
//! Async worker threads run the per-item drivers and backoff timers; the
//! runtime's blocking threads (capped at `workers`) execute transport calls.
//! The pool is created explicitly and released by `shutdown` or drop.

use tokio::runtime::{Builder, Handle, Runtime};

/// Driver tasks only await channels and timers; a few threads suffice.
const MAX_DRIVER_THREADS: usize = 4;

pub struct WorkerPool {
    runtime: Option<Runtime>,
    handle: Handle,
    workers: usize,
}

impl WorkerPool {
    /// Start a pool with `workers` blocking threads for network calls.
    pub fn new(workers: usize) -> std::io::Result<Self> {
        let workers = workers.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers.min(MAX_DRIVER_THREADS))
            .max_blocking_threads(workers)
            .thread_name("bulkpost-worker")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        tracing::debug!(workers, "worker pool started");
        Ok(Self {
            runtime: Some(runtime),
            handle,
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Release the pool's threads. Tasks still queued are dropped, so callers
    /// drain in-flight work first (see `Dispatcher::shutdown`).
    pub fn shutdown(mut self) {
        self.release();
    }

    // shutdown_background never blocks, so this is safe inside async code.
    fn release(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            tracing::debug!(workers = self.workers, "worker pool released");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.release();
    }
}
