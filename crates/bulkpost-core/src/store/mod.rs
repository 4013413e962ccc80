//! Persistence seam for resolved results.
//!
//! The coordinator calls `upsert` once per completed chunk with that chunk's
//! results. Failures are logged and counted by the caller; they never abort a
//! run.

mod db;

use std::future::Future;

use crate::model::ProcessResult;

pub use db::{ResultDb, StoredCounts, StoredResult};

pub trait ResultStore<R>: Sync {
    fn upsert(&self, results: &[ProcessResult<R>]) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Store that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl<R: Sync> ResultStore<R> for NullStore {
    async fn upsert(&self, _results: &[ProcessResult<R>]) -> anyhow::Result<()> {
        Ok(())
    }
}
