//! `bulkpost run` – POST a JSON-lines file through the dispatcher.

use anyhow::{bail, Context, Result};
use bulkpost_core::batch::{
    BatchCoordinator, BatchError, ChunkProgress, CompletionReport, JsonLinesSource,
};
use bulkpost_core::codec::RawJsonCodec;
use bulkpost_core::config::{BulkConfig, RetryConfig};
use bulkpost_core::dispatcher::{Dispatcher, WorkerPool};
use bulkpost_core::store::ResultDb;
use bulkpost_core::transport::CurlTransport;
use std::path::Path;

/// Command-line values that take precedence over config.toml.
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub endpoint: Option<String>,
    pub concurrency: Option<usize>,
    pub workers: Option<usize>,
    pub chunk_size: Option<usize>,
    pub max_retries: Option<u32>,
}

impl RunOverrides {
    pub fn apply(self, mut cfg: BulkConfig) -> BulkConfig {
        if let Some(endpoint) = self.endpoint {
            cfg.endpoint = endpoint;
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(n) = self.workers {
            cfg.workers = n;
        }
        if let Some(n) = self.chunk_size {
            cfg.chunk_size = n;
        }
        if let Some(n) = self.max_retries {
            let mut retry: RetryConfig = cfg.retry.take().unwrap_or_default();
            retry.max_retries = n;
            cfg.retry = Some(retry);
        }
        cfg
    }
}

pub async fn run_batch(cfg: BulkConfig, input: &Path, persist: bool) -> Result<()> {
    cfg.validate()?;
    let mut source = JsonLinesSource::open(input)
        .with_context(|| format!("open input {}", input.display()))?;
    let db = if persist {
        Some(ResultDb::open_default().await?)
    } else {
        None
    };

    let pool = WorkerPool::new(cfg.workers).context("start worker pool")?;
    let dispatcher = Dispatcher::new(cfg.dispatch_config(), CurlTransport::new(), RawJsonCodec, pool);

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ChunkProgress>(16);
    let progress_handle = tokio::spawn(async move {
        while let Some(p) = progress_rx.recv().await {
            println!(
                "  chunk {:>4}: {} done ({} ok, {} failed)  {:.1} items/s",
                p.chunk_index,
                p.completed,
                p.succeeded,
                p.failed,
                p.items_per_sec()
            );
        }
    });

    let outcome = {
        let coordinator = BatchCoordinator::new(&dispatcher).with_progress(progress_tx);
        match &db {
            Some(db) => coordinator.with_store(db).run(&mut source, cfg.chunk_size).await,
            None => coordinator.run(&mut source, cfg.chunk_size).await,
        }
    };
    dispatcher.shutdown().await;
    let _ = progress_handle.await;

    if let Some(e) = source.take_error() {
        tracing::error!(error = %e, "input read failed; remaining lines skipped");
        eprintln!("warning: reading {} stopped early: {}", input.display(), e);
    }

    match outcome {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(BatchError::FatalInfrastructure { source, partial }) => {
            println!(
                "aborted after {} item(s): {} succeeded, {} failed",
                partial.results.len(),
                partial.success_count,
                partial.failure_count
            );
            bail!("batch aborted: {source}")
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &CompletionReport) {
    println!(
        "{} item(s) in {} chunk(s), {:.1}s: {} succeeded, {} failed ({} terminal, {} exhausted)",
        report.submitted,
        report.chunks,
        report.elapsed.as_secs_f64(),
        report.succeeded,
        report.failed(),
        report.terminal_failed,
        report.exhausted
    );
    if report.duplicates > 0 {
        println!(
            "warning: {} item(s) repeated an earlier id and were not counted",
            report.duplicates
        );
    }
    if report.unpersisted_chunks > 0 {
        println!(
            "warning: results of {} chunk(s) could not be saved",
            report.unpersisted_chunks
        );
    }
}
