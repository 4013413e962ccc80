//! Bounded-concurrency dispatcher.
//!
//! `submit` hands an item to a driver task on the worker pool and returns a
//! `Submission` future that resolves with the item's `ProcessResult`. The
//! driver loops attempt → classify → (backoff → attempt)* until the item
//! reaches success, terminal failure, or exhaustion. Every network call holds
//! one `ConcurrencyToken`; backoff waits are timers on the pool and hold no
//! token, so a retrying item never occupies a slot while it sleeps.

mod attempt;
mod error;
mod guard;
mod pool;
mod tokens;

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};

use crate::codec::Codec;
use crate::model::{ItemId, ProcessResult, Resolution, WorkItem};
use crate::retry::{ItemError, Outcome, RetryDecision, RetryPolicy};
use crate::sink::ResultSink;
use crate::transport::{RequestTemplate, Transport};

use self::attempt::run_attempt;
use self::guard::UnresolvedGuard;

pub use self::attempt::Attempt;
pub use self::error::DispatchError;
pub use self::pool::WorkerPool;
pub use self::tokens::{ConcurrencyToken, TokenPool};

/// Knobs for one dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum simultaneous network calls.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub request: RequestTemplate,
}

impl DispatchConfig {
    pub fn new(request: RequestTemplate) -> Self {
        Self {
            concurrency: 100,
            retry: RetryPolicy::default(),
            request,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

struct Shared<T, C: Codec> {
    transport: Arc<T>,
    codec: C,
    tokens: TokenPool,
    retry: RetryPolicy,
    request: RequestTemplate,
    sink: ResultSink<C::Response>,
    accepting: AtomicBool,
    unresolved: Arc<watch::Sender<usize>>,
}

impl<T, C: Codec> Shared<T, C> {
    fn resolve(
        &self,
        item_id: ItemId,
        attempts: u32,
        resolution: Resolution<C::Response>,
    ) -> ProcessResult<C::Response> {
        let result = ProcessResult {
            item_id,
            attempts,
            resolution,
        };
        tracing::debug!(
            item_id = %result.item_id,
            attempts,
            resolution = result.resolution.label(),
            "item resolved"
        );
        if let Err(e) = self.sink.record(result.clone()) {
            tracing::error!(error = %e, "result not recorded");
        }
        result
    }
}

/// Pending result of one submitted item.
pub struct Submission<R> {
    item_id: ItemId,
    rx: oneshot::Receiver<Result<ProcessResult<R>, DispatchError>>,
}

impl<R> Submission<R> {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

impl<R> Future for Submission<R> {
    type Output = Result<ProcessResult<R>, DispatchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Driver task dropped without resolving: the pool went away under it.
            Poll::Ready(Err(_)) => Poll::Ready(Err(DispatchError::FatalInfrastructure(format!(
                "worker pool dropped item {}",
                this.item_id
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub struct Dispatcher<T: Transport, C: Codec> {
    shared: Arc<Shared<T, C>>,
    pool: WorkerPool,
}

impl<T: Transport, C: Codec> Dispatcher<T, C> {
    pub fn new(config: DispatchConfig, transport: T, codec: C, pool: WorkerPool) -> Self {
        let (unresolved, _) = watch::channel(0usize);
        if pool.workers() < config.concurrency {
            tracing::warn!(
                workers = pool.workers(),
                concurrency = config.concurrency,
                "worker pool smaller than concurrency; at most `workers` calls run at once"
            );
        }
        tracing::info!(
            concurrency = config.concurrency,
            workers = pool.workers(),
            max_retries = config.retry.max_retries,
            initial_backoff_ms = config.retry.initial_backoff.as_millis() as u64,
            endpoint = %config.request.endpoint,
            "dispatcher started"
        );
        Self {
            shared: Arc::new(Shared {
                transport: Arc::new(transport),
                codec,
                tokens: TokenPool::new(config.concurrency),
                retry: config.retry,
                request: config.request,
                sink: ResultSink::new(),
                accepting: AtomicBool::new(true),
                unresolved: Arc::new(unresolved),
            }),
            pool,
        }
    }

    /// Hand an item to the pool. The returned future resolves once the item
    /// reaches a terminal state; the result is also recorded in `sink()`.
    pub fn submit(
        &self,
        item: WorkItem<C::Payload>,
    ) -> Result<Submission<C::Response>, DispatchError> {
        if !self.shared.accepting.load(Ordering::Acquire) {
            return Err(DispatchError::ShuttingDown);
        }
        let item_id = item.id.clone();
        let (tx, rx) = oneshot::channel();
        let guard = UnresolvedGuard::new(&self.shared.unresolved);
        let shared = Arc::clone(&self.shared);
        let handle = self.pool.handle().clone();
        self.pool.handle().spawn(async move {
            let result = drive(shared, handle, item).await;
            // Count the item resolved before the submitter can observe it.
            drop(guard);
            let _ = tx.send(result);
        });
        Ok(Submission { item_id, rx })
    }

    pub fn sink(&self) -> &ResultSink<C::Response> {
        &self.shared.sink
    }

    /// Items submitted whose result has not been delivered yet.
    pub fn unresolved(&self) -> usize {
        *self.shared.unresolved.borrow()
    }

    /// Tokens currently held by network calls.
    pub fn in_flight(&self) -> usize {
        self.shared.tokens.in_use()
    }

    pub fn concurrency(&self) -> usize {
        self.shared.tokens.capacity()
    }

    /// Stop accepting submissions and close the token pool immediately.
    /// Items waiting for a token or in backoff fail with
    /// `FatalInfrastructure`; calls already on the wire finish on their own.
    pub fn abort(&self) {
        self.shared.accepting.store(false, Ordering::Release);
        self.shared.tokens.close();
        tracing::warn!(unresolved = self.unresolved(), "dispatcher aborted");
    }

    /// Stop accepting submissions, wait for every unresolved item, then
    /// release the token pool and the worker pool.
    pub async fn shutdown(self) {
        self.shared.accepting.store(false, Ordering::Release);
        let mut unresolved = self.shared.unresolved.subscribe();
        let _ = unresolved.wait_for(|n| *n == 0).await;
        self.shared.tokens.close();
        self.pool.shutdown();
        tracing::info!("dispatcher shut down");
    }
}

/// Drive one item to a terminal state.
async fn drive<T: Transport, C: Codec>(
    shared: Arc<Shared<T, C>>,
    handle: Handle,
    item: WorkItem<C::Payload>,
) -> Result<ProcessResult<C::Response>, DispatchError> {
    let id = item.id;
    let body: Arc<[u8]> = match shared.codec.encode(&item.payload) {
        Ok(bytes) => Arc::from(bytes),
        Err(e) => {
            tracing::warn!(item_id = %id, error = %e, "payload encode failed; item not sent");
            return Ok(shared.resolve(id, 0, Resolution::TerminalFailure(e.into())));
        }
    };

    let mut number = 0u32;
    loop {
        let attempt = run_attempt(
            &shared.tokens,
            &shared.transport,
            &shared.request,
            &handle,
            &id,
            number,
            Arc::clone(&body),
        )
        .await?;

        let decision = shared.retry.decide(attempt.number, &attempt.outcome);
        let resolution = match (decision, attempt.outcome) {
            (RetryDecision::RetryAfter(delay), Outcome::RetryableFailure(reason)) => {
                tracing::warn!(
                    item_id = %id,
                    attempt = number,
                    max_retries = shared.retry.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    reason = %reason,
                    "retryable failure; backing off"
                );
                tokio::time::sleep(delay).await;
                number += 1;
                continue;
            }
            (_, Outcome::Success(bytes)) => match shared.codec.decode(&bytes) {
                Ok(response) => Resolution::Success(response),
                Err(e) => {
                    tracing::warn!(item_id = %id, error = %e, "response decode failed");
                    Resolution::TerminalFailure(e.into())
                }
            },
            (_, Outcome::TerminalFailure(reason)) => {
                tracing::warn!(item_id = %id, attempt = number, reason = %reason, "terminal failure; not retrying");
                Resolution::TerminalFailure(reason)
            }
            (_, Outcome::RetryableFailure(reason)) => {
                tracing::warn!(item_id = %id, attempts = number + 1, reason = %reason, "retries exhausted");
                Resolution::Exhausted(ItemError::RetriesExhausted {
                    attempts: number + 1,
                    last: Box::new(reason),
                })
            }
        };
        return Ok(shared.resolve(id, number + 1, resolution));
    }
}
