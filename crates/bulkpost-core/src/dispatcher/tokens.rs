//! Concurrency token pool shared by every in-flight attempt.
//!
//! A token is checked out for exactly one network call and returned when the
//! call finishes; the number checked out never exceeds `capacity`.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::error::DispatchError;

/// One unit of the concurrency ceiling. Returned to the pool on drop.
#[derive(Debug)]
pub struct ConcurrencyToken {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug)]
pub struct TokenPool {
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

impl TokenPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently checked out.
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free token. Fails only once the pool has been closed.
    pub async fn acquire(&self) -> Result<ConcurrencyToken, DispatchError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::FatalInfrastructure("token pool closed".to_string()))?;
        Ok(ConcurrencyToken { _permit: permit })
    }

    /// Close the pool: pending and future `acquire` calls fail.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}
